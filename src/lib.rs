// 电影目录后端库
//
// 本库提供电影目录的核心功能，包括：
// - API 路由与鉴权
// - 筛选条件与查询构建
// - 数据库操作
// - 对象存储与邮件
// - 客户端筛选状态

pub mod api;
pub mod client;
pub mod config;
pub mod database;
pub mod external;
pub mod models;
pub mod services;
