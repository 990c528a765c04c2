use serde::{Deserialize, Serialize};

/// 用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// 主键
    #[validate(required)]
    pub id: i64,
    /// 用户名
    pub name: String,
    #[serde(rename = "mail")]
    pub email: Option<String>,
    #[serde(skip)]
    pub password: String,
    pub tags: Vec<String>,
    pub status: Status,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Status {
    Active,
    Disabled,
}

/// 分页结果
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    /// 总数
    pub total: i64,
    pub items: Vec<T>,
}

/// 商品分类
#[derive(Debug, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub parent: Option<Box<Category>>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    /// 页码
    /// @value 1
    pub page: i32,
    pub keyword: String,
}
