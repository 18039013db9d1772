//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口
//! - [`products`] - 商品目录接口
//! - [`cart`] - 购物车接口
//! - [`favorites`] - 收藏接口
//! - [`addresses`] - 收货地址接口
//! - [`payment_methods`] - 支付方式接口
//! - [`orders`] - 订单接口

pub mod convert;

pub mod auth;
pub mod health;

// Data models API
pub mod addresses;
pub mod cart;
pub mod favorites;
pub mod orders;
pub mod payment_methods;
pub mod products;

// Re-export common types for handlers
pub use crate::utils::{ApiResponse, AppResult};
