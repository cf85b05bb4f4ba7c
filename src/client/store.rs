// 客户端筛选状态
//
// 当前条件、URL 查询串和列表结果各自通过 watch 通道发布。
// 每次条件变化都发起一次新请求，不取消旧请求；
// 只有最新序号的响应会写入结果。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::api::{ClientResult, MovieApi};
use crate::models::{encode_query, FilterCriteria, FilterError, FilterPatch, Movie, MovieInput};

/// 一次成功请求的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListSnapshot {
    pub movies: Arc<Vec<Movie>>,
    pub total: i64,
    /// 产生该结果的请求序号，初始为 0
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching,
}

struct StoreInner {
    api: Arc<dyn MovieApi>,
    criteria: Mutex<FilterCriteria>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
    snapshot: watch::Sender<ListSnapshot>,
    status: watch::Sender<FetchStatus>,
    url_query: watch::Sender<String>,
}

/// 电影列表的筛选状态句柄，可克隆，所有克隆共享同一状态
#[derive(Clone)]
pub struct MovieStore {
    inner: Arc<StoreInner>,
}

impl MovieStore {
    pub fn new(api: Arc<dyn MovieApi>) -> Self {
        let (snapshot, _) = watch::channel(ListSnapshot::default());
        let (status, _) = watch::channel(FetchStatus::Idle);
        let (url_query, _) = watch::channel(String::new());

        Self {
            inner: Arc::new(StoreInner {
                api,
                criteria: Mutex::new(FilterCriteria::default()),
                issued: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                snapshot,
                status,
                url_query,
            }),
        }
    }

    /// 订阅列表结果
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<FetchStatus> {
        self.inner.status.subscribe()
    }

    /// 订阅页面 URL 查询串（不含 `?`）
    pub fn subscribe_url(&self) -> watch::Receiver<String> {
        self.inner.url_query.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn status(&self) -> FetchStatus {
        *self.inner.status.borrow()
    }

    pub fn url_query(&self) -> String {
        self.inner.url_query.borrow().clone()
    }

    /// 当前条件的副本
    pub fn criteria(&self) -> FilterCriteria {
        self.lock_criteria().clone()
    }

    /// 合并条件修改，回到第一页并重新加载
    pub fn set_filters(&self, patch: FilterPatch) -> JoinHandle<()> {
        let criteria = {
            let mut current = self.lock_criteria();
            current.apply(patch);
            current.clone()
        };
        self.publish_url(&criteria);
        self.fetch(criteria)
    }

    /// 翻页，其余条件不变
    pub fn set_page(&self, page: u32) -> JoinHandle<()> {
        let criteria = {
            let mut current = self.lock_criteria();
            current.go_to_page(page);
            current.clone()
        };
        self.publish_url(&criteria);
        self.fetch(criteria)
    }

    /// 恢复默认条件并清空 URL 参数
    pub fn clear_filters(&self) -> JoinHandle<()> {
        let criteria = {
            let mut current = self.lock_criteria();
            *current = FilterCriteria::default();
            current.clone()
        };
        self.publish_url(&criteria);
        self.fetch(criteria)
    }

    /// 页面加载时从 URL 恢复条件和页码
    pub fn from_url(&self, query: &str) -> Result<JoinHandle<()>, FilterError> {
        let restored = FilterCriteria::from_url_query(query.trim_start_matches('?'))?;
        {
            let mut current = self.lock_criteria();
            *current = restored.clone();
        }
        self.publish_url(&restored);
        Ok(self.fetch(restored))
    }

    /// 用当前条件重新加载
    pub fn refresh(&self) -> JoinHandle<()> {
        let criteria = self.criteria();
        self.fetch(criteria)
    }

    pub async fn add_movie(&self, input: &MovieInput, token: &str) -> ClientResult<Movie> {
        let movie = self.inner.api.create(input, token).await?;
        self.refresh_and_wait().await;
        Ok(movie)
    }

    pub async fn update_movie(
        &self,
        id: &str,
        input: &MovieInput,
        token: &str,
    ) -> ClientResult<Movie> {
        let movie = self.inner.api.update(id, input, token).await?;
        self.refresh_and_wait().await;
        Ok(movie)
    }

    pub async fn delete_movie(&self, id: &str, token: &str) -> ClientResult<()> {
        self.inner.api.delete(id, token).await?;
        self.refresh_and_wait().await;
        Ok(())
    }

    async fn refresh_and_wait(&self) {
        if let Err(e) = self.refresh().await {
            tracing::error!("Refresh task failed: {}", e);
        }
    }

    fn lock_criteria(&self) -> MutexGuard<'_, FilterCriteria> {
        // 持锁期间不会 panic，中毒后数据仍然可用
        self.inner
            .criteria
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish_url(&self, criteria: &FilterCriteria) {
        let query = encode_query(&criteria.to_url_params());
        self.inner.url_query.send_if_modified(|current| {
            if *current == query {
                false
            } else {
                *current = query;
                true
            }
        });
    }

    fn fetch(&self, criteria: FilterCriteria) -> JoinHandle<()> {
        let seq = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        self.inner.status.send_replace(FetchStatus::Fetching);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            match inner.api.list(&criteria).await {
                Ok(page) => {
                    let published = inner.snapshot.send_if_modified(|current| {
                        if seq != inner.issued.load(Ordering::SeqCst) || seq <= current.seq {
                            return false;
                        }
                        *current = ListSnapshot {
                            movies: Arc::new(page.movies),
                            total: page.total,
                            seq,
                        };
                        true
                    });
                    if !published {
                        tracing::debug!("Discarding stale movie list response #{}", seq);
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to fetch movies (request #{}): {}", seq, e);
                }
            }

            if inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                inner.status.send_replace(FetchStatus::Idle);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::ClientError;
    use crate::models::{AgeRating, MovieFactory, MoviePage, SortBy, SortOrder};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::time::Duration;

    /// 按搜索词返回一部同名电影；搜索词以 "slow" 开头时延迟响应
    #[derive(Default)]
    struct MockApi {
        requests: Mutex<Vec<FilterCriteria>>,
        fail: bool,
    }

    impl MockApi {
        fn requests(&self) -> Vec<FilterCriteria> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn movie(title: &str) -> Movie {
        let date = NaiveDate::from_ymd_opt(1999, 3, 31).unwrap();
        MovieFactory::create_movie(title, date, 136, AgeRating::Fourteen, None).unwrap()
    }

    #[async_trait]
    impl MovieApi for MockApi {
        async fn list(&self, criteria: &FilterCriteria) -> ClientResult<MoviePage> {
            self.requests.lock().unwrap().push(criteria.clone());
            let search = criteria.search.clone().unwrap_or_else(|| "all".to_string());
            if search.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(150)).await;
            }
            if self.fail {
                return Err(ClientError::Status {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(MoviePage {
                movies: vec![movie(&search)],
                total: 1,
            })
        }

        async fn create(&self, input: &MovieInput, _token: &str) -> ClientResult<Movie> {
            Ok(movie(input.title.as_deref().unwrap_or("untitled")))
        }

        async fn update(&self, _id: &str, input: &MovieInput, _token: &str) -> ClientResult<Movie> {
            Ok(movie(input.title.as_deref().unwrap_or("untitled")))
        }

        async fn delete(&self, _id: &str, _token: &str) -> ClientResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_set_filters_publishes_snapshot_and_url() {
        let api = Arc::new(MockApi::default());
        let store = MovieStore::new(api.clone());

        store
            .set_filters(
                FilterPatch::new()
                    .search("Matrix")
                    .sort(SortBy::Title, SortOrder::Asc),
            )
            .await
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.seq, 1);
        assert_eq!(snapshot.total, 1);
        assert_eq!(snapshot.movies[0].title, "Matrix");
        assert_eq!(store.url_query(), "search=Matrix&sortBy=titulo&order=asc");
        assert_eq!(store.status(), FetchStatus::Idle);
        assert_eq!(api.requests()[0].skip, 0);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let api = Arc::new(MockApi::default());
        let store = MovieStore::new(api);

        let slow = store.set_filters(FilterPatch::new().search("slow"));
        let fast = store.set_filters(FilterPatch::new().search("fast"));
        fast.await.unwrap();
        slow.await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.seq, 2);
        assert_eq!(snapshot.movies[0].title, "fast");
    }

    #[tokio::test]
    async fn test_empty_patch_only_resets_page() {
        let api = Arc::new(MockApi::default());
        let store = MovieStore::new(api);

        store
            .set_filters(FilterPatch::new().search("Matrix").genres(["Ação"]))
            .await
            .unwrap();
        store.set_page(3).await.unwrap();
        assert_eq!(store.criteria().skip, 20);
        assert!(store.url_query().ends_with("page=3"));

        let before = store.criteria();
        store.set_filters(FilterPatch::new()).await.unwrap();
        let after = store.criteria();

        assert_eq!(after.skip, 0);
        assert_eq!(FilterCriteria { skip: 0, ..before }, after);
        assert!(!store.url_query().contains("page="));
    }

    #[tokio::test]
    async fn test_set_page_below_one_is_first_page() {
        let store = MovieStore::new(Arc::new(MockApi::default()));
        store.set_page(0).await.unwrap();
        assert_eq!(store.criteria().skip, 0);
        assert_eq!(store.criteria().page(), 1);
    }

    #[tokio::test]
    async fn test_clear_filters_resets_everything() {
        let store = MovieStore::new(Arc::new(MockApi::default()));
        store
            .set_filters(
                FilterPatch::new()
                    .search("Matrix")
                    .duration_range(Some(90), None)
                    .sort(SortBy::Title, SortOrder::Asc),
            )
            .await
            .unwrap();
        store.set_page(2).await.unwrap();
        assert!(store.url_query().contains("sortBy=titulo"));

        store.clear_filters().await.unwrap();

        assert_eq!(store.criteria(), FilterCriteria::default());
        assert_eq!(store.url_query(), "");
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let store = MovieStore::new(Arc::new(MockApi::default()));
        store.set_filters(FilterPatch::new().search("Matrix")).await.unwrap();
        let before = store.snapshot();

        let failing = MovieStore {
            inner: Arc::new(StoreInner {
                api: Arc::new(MockApi {
                    fail: true,
                    ..Default::default()
                }),
                criteria: Mutex::new(store.criteria()),
                issued: AtomicU64::new(before.seq),
                in_flight: AtomicUsize::new(0),
                snapshot: watch::channel(before.clone()).0,
                status: watch::channel(FetchStatus::Idle).0,
                url_query: watch::channel(String::new()).0,
            }),
        };
        failing.refresh().await.unwrap();

        assert_eq!(failing.snapshot(), before);
        assert_eq!(failing.status(), FetchStatus::Idle);
    }

    #[tokio::test]
    async fn test_from_url_restores_page() {
        let api = Arc::new(MockApi::default());
        let store = MovieStore::new(api.clone());

        store
            .from_url("?search=Matrix&generos=A%C3%A7%C3%A3o&page=2")
            .unwrap()
            .await
            .unwrap();

        let criteria = store.criteria();
        assert_eq!(criteria.search.as_deref(), Some("Matrix"));
        assert_eq!(criteria.genres, vec!["Ação".to_string()]);
        assert_eq!(criteria.page(), 2);
        assert_eq!(api.requests()[0].skip, 10);
        assert!(store.from_url("minDuration=abc").is_err());
    }

    #[tokio::test]
    async fn test_mutations_refresh_list() {
        let api = Arc::new(MockApi::default());
        let store = MovieStore::new(api.clone());

        let input = MovieInput {
            title: Some("Matrix".to_string()),
            ..Default::default()
        };
        let created = store.add_movie(&input, "token").await.unwrap();
        assert_eq!(created.title, "Matrix");
        store.delete_movie(&created.id, "token").await.unwrap();

        assert_eq!(api.requests().len(), 2);
        assert_eq!(store.snapshot().seq, 2);
    }
}
