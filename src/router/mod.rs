//! 后台主路由：按信封 type 分发，一请求恰好一响应

mod host;

pub use host::{HostRouter, RouterHandle};
