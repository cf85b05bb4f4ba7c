/// 分页按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// 总页数；`take` 为 0 时按一页处理
pub fn total_pages(total: i64, take: u32) -> u32 {
    if total <= 0 {
        return 0;
    }
    let take = i64::from(take.max(1));
    let pages = (total + take - 1) / take;
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// 当前页附近的页码窗口
///
/// 窗口从 `current - 2` 开始，最多 `max_buttons` 个页码；
/// 窗口外的首页和末页单独列出，中间用省略号隔开。
pub fn page_window(current: u32, total_pages: u32, max_buttons: u32) -> Vec<PageItem> {
    if total_pages == 0 {
        return Vec::new();
    }

    let current = current.clamp(1, total_pages);
    let start = current.saturating_sub(2).max(1);
    let end = total_pages.min(start + max_buttons.max(1) - 1);

    let mut items = Vec::new();
    if start > 1 {
        items.push(PageItem::Page(1));
        items.push(PageItem::Ellipsis);
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < total_pages {
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total_pages));
    }
    items
}
