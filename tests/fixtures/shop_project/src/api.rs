use crate::model::{Category, Page, User, UserQuery};
use axum::extract::{Json, Path, Query, State};

pub struct AppState;
pub struct Error;

/// 根据主键查询用户
/// @name 用户详情
#[get("/users/{id}")]
pub async fn get_user(
    Path(id): Path<i64>,
    #[header(name = "X-Token", description = "令牌")] token: String,
    State(state): State<AppState>,
) -> Result<Json<User>, Error> {
    todo!()
}

/// 用户列表
#[get("/users")]
pub async fn list_users(Query(query): Query<UserQuery>) -> Json<Page<User>> {
    todo!()
}

/// 新增用户
#[post("/users")]
pub async fn create_user(Json(user): Json<User>) -> Json<i64> {
    todo!()
}

pub struct CategoryService;

impl CategoryService {
    /// 分类树
    pub fn tree(&self, root: i64) -> Category {
        todo!()
    }
}
