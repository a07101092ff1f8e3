//! 应用门面
//! navigate：守卫 + 渲染；dispatch：校验当前页面绑定的操作、确认、修改数据后重新导航

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::models::{Role, Session};
use crate::router::{Guard, Route};
use crate::services::auth::AuthManager;
use crate::services::scoring::UNANSWERED;
use crate::services::storage::StorageAdapter;
use crate::services::store::{DomainStore, QuestionEdit};
use crate::views::{self, dashboard_path};

/// 返回给 WebView 的页面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 实际渲染的路径（守卫跳转后可能与请求不同）
    pub path: String,
    pub nav: String,
    pub body: String,
    pub notice: Option<String>,
}

/// 前端提交的操作请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub path: String,
    pub action: String,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// 页面上可触发的操作，课程/测验 ID 来自当前路由
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Logout,
    Login { email: String, password: String },
    Register { name: String, email: String, password: String, role: Role },
    CreateCourse { title: String, description: String },
    DeleteCourse { course_id: String },
    AddMaterial { title: String, url: String },
    DeleteMaterial { material_id: String },
    AddQuiz { title: String },
    DeleteQuiz { quiz_id: String },
    AddQuestion { text: String, options: String, correct_index: String },
    SaveQuestions { edits: Vec<QuestionEdit> },
    DeleteQuestion { question_id: String },
    SubmitQuiz { answers: HashMap<String, i64> },
    ChangeRole { user_id: String, role: Role },
    DeleteUser { user_id: String },
}

impl Action {
    /// 由表单字段构造操作
    pub fn from_fields(name: &str, fields: &HashMap<String, String>) -> Result<Self> {
        let field = |key: &str| fields.get(key).cloned().unwrap_or_default();
        let role = |key: &str| field(key).parse::<Role>().map_err(|_| AppError::UnsupportedAction);

        let action = match name {
            "logout" => Action::Logout,
            "login" => Action::Login {
                email: field("email"),
                password: field("password"),
            },
            "register" => Action::Register {
                name: field("name"),
                email: field("email"),
                password: field("password"),
                role: role("role")?,
            },
            "create_course" => Action::CreateCourse {
                title: field("title"),
                description: field("description"),
            },
            "delete_course" => Action::DeleteCourse { course_id: field("id") },
            "add_material" => Action::AddMaterial {
                title: field("title"),
                url: field("url"),
            },
            "delete_material" => Action::DeleteMaterial { material_id: field("id") },
            "add_quiz" => Action::AddQuiz { title: field("title") },
            "delete_quiz" => Action::DeleteQuiz { quiz_id: field("id") },
            "add_question" => Action::AddQuestion {
                text: field("text"),
                options: field("options"),
                correct_index: field("correctIndex"),
            },
            "save_questions" => Action::SaveQuestions {
                edits: question_edits(fields),
            },
            "delete_question" => Action::DeleteQuestion { question_id: field("id") },
            "submit_quiz" => Action::SubmitQuiz {
                answers: fields
                    .iter()
                    .filter_map(|(key, value)| {
                        let id = key.strip_prefix("q_")?;
                        Some((id.to_string(), value.trim().parse().unwrap_or(UNANSWERED)))
                    })
                    .collect(),
            },
            "change_role" => Action::ChangeRole {
                user_id: field("id"),
                role: role("role")?,
            },
            "delete_user" => Action::DeleteUser { user_id: field("id") },
            _ => return Err(AppError::UnsupportedAction),
        };
        Ok(action)
    }

    /// 删除类操作需要用户确认
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Action::DeleteCourse { .. }
                | Action::DeleteMaterial { .. }
                | Action::DeleteQuiz { .. }
                | Action::DeleteQuestion { .. }
                | Action::DeleteUser { .. }
        )
    }

    /// 该操作是否绑定在指定页面上
    pub fn is_bound_to(&self, route: &Route) -> bool {
        match self {
            Action::Logout => true,
            Action::Login { .. } => *route == Route::Login,
            Action::Register { .. } => *route == Route::Register,
            Action::CreateCourse { .. } | Action::DeleteCourse { .. } => *route == Route::Dashboard(Role::Faculty),
            Action::AddMaterial { .. }
            | Action::DeleteMaterial { .. }
            | Action::AddQuiz { .. }
            | Action::DeleteQuiz { .. } => matches!(route, Route::Course(_)),
            Action::AddQuestion { .. } | Action::SaveQuestions { .. } | Action::DeleteQuestion { .. } => {
                matches!(route, Route::QuizBuilder { .. })
            }
            Action::SubmitQuiz { .. } => matches!(route, Route::Quiz { .. }),
            Action::ChangeRole { .. } | Action::DeleteUser { .. } => *route == Route::Dashboard(Role::Admin),
        }
    }
}

/// 把 `{questionId}.{field}` 形式的字段归并为每题一条编辑
fn question_edits(fields: &HashMap<String, String>) -> Vec<QuestionEdit> {
    let mut grouped: Vec<QuestionEdit> = Vec::new();
    for (key, value) in fields {
        let Some((id, field)) = key.rsplit_once('.') else {
            continue;
        };
        let idx = match grouped.iter().position(|e| e.id == id) {
            Some(idx) => idx,
            None => {
                grouped.push(QuestionEdit {
                    id: id.to_string(),
                    ..Default::default()
                });
                grouped.len() - 1
            }
        };
        let edit = &mut grouped[idx];
        match field {
            "text" => edit.text = Some(value.clone()),
            "options" => edit.options = Some(value.clone()),
            "correctIndex" => edit.correct_index = Some(value.clone()),
            _ => {}
        }
    }
    grouped
}

/// 操作执行后的去向
enum Outcome {
    Navigate { path: String, notice: Option<String> },
    Render { body: String },
}

impl Outcome {
    fn to(route: Route) -> Self {
        Outcome::Navigate {
            path: route.path(),
            notice: None,
        }
    }
}

/// 应用状态
pub struct ElearnApp {
    store: DomainStore,
    auth: AuthManager,
    config: AppConfig,
}

impl ElearnApp {
    pub fn new(storage: StorageAdapter, config: AppConfig) -> Result<Self> {
        let store = DomainStore::new(storage);
        // 首次启动写入种子数据
        store.dataset()?;
        Ok(Self {
            auth: AuthManager::new(store.clone()),
            store,
            config,
        })
    }

    /// 按配置打开数据库
    pub fn open(config: AppConfig) -> Result<Self> {
        let storage = StorageAdapter::open(&config.database_path())?;
        Self::new(storage, config)
    }

    pub fn store(&self) -> &DomainStore {
        &self.store
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// 导航：守卫后渲染页面
    pub fn navigate(&self, path: &str) -> Result<Page> {
        self.navigate_with_notice(path, None)
    }

    fn navigate_with_notice(&self, path: &str, notice: Option<String>) -> Result<Page> {
        let session = self.auth.current_session()?;
        let mut route = Route::parse(path);
        // 跳转目标都是公开页面，最多跳转一次
        if let Guard::Redirect(target) = route.guard(session.as_ref()) {
            log::debug!("guard redirected {} to {}", route, target);
            route = target;
        }
        log::debug!("navigate {}", route);

        Ok(Page {
            path: route.path(),
            nav: views::render_nav(session.as_ref()),
            body: self.render(&route, session.as_ref())?,
            notice,
        })
    }

    fn render(&self, route: &Route, session: Option<&Session>) -> Result<String> {
        let db = self.store.dataset()?;
        let body = match (route, session) {
            (Route::Home, _) => views::render_home(&db),
            (Route::Login, _) => views::render_login(),
            (Route::Register, _) => views::render_register(),
            (Route::Leaderboard, _) => views::render_leaderboard(&db, self.config.leaderboard_size),
            (Route::Dashboard(Role::Student), Some(session)) => views::render_student_dashboard(&db, session),
            (Route::Dashboard(Role::Faculty), Some(session)) => views::render_faculty_dashboard(&db, session),
            (Route::Dashboard(Role::Admin), Some(_)) => views::render_admin_dashboard(&db),
            (Route::Course(id), Some(_)) => views::render_course_detail(&db, id),
            (Route::QuizBuilder { course_id, quiz_id }, Some(_)) => views::render_quiz_builder(&db, course_id, quiz_id),
            (Route::Quiz { course_id, quiz_id }, Some(_)) => views::render_quiz(&db, course_id, quiz_id),
            (Route::Materials(id), Some(session)) => {
                let back = match session.role {
                    Role::Faculty => Route::Course(id.clone()).path(),
                    role => dashboard_path(role),
                };
                views::render_materials(&db, id, &back)
            }
            (Route::NotFound(_), _) => views::render_not_found("Page"),
            // 守卫保证受保护页面一定有会话
            (_, None) => return Err(AppError::NotAuthenticated),
        };
        Ok(body)
    }

    /// 执行当前页面上的操作
    ///
    /// 用户可见的错误以提示形式留在当前页面；存储等内部错误向上返回。
    pub async fn dispatch(&self, request: ActionRequest) -> Result<Page> {
        let route = Route::parse(&request.path);
        let action = match Action::from_fields(&request.action, &request.fields) {
            Ok(action) => action,
            Err(e) => return self.navigate_with_notice(&request.path, Some(e.to_string())),
        };

        if !action.is_bound_to(&route) {
            log::warn!("action {} rejected on {}", request.action, route);
            return self.navigate_with_notice(&request.path, Some(AppError::UnsupportedAction.to_string()));
        }

        let session = self.auth.current_session()?;
        if action != Action::Logout {
            if let Guard::Redirect(_) = route.guard(session.as_ref()) {
                return self.navigate(&request.path);
            }
        }

        if action.is_destructive() && !request.confirmed {
            log::info!("{} on {} cancelled", request.action, route);
            return self.navigate(&request.path);
        }

        match self.perform(&route, session.as_ref(), action).await {
            Ok(Outcome::Navigate { path, notice }) => self.navigate_with_notice(&path, notice),
            Ok(Outcome::Render { body }) => {
                let session = self.auth.current_session()?;
                Ok(Page {
                    path: route.path(),
                    nav: views::render_nav(session.as_ref()),
                    body,
                    notice: None,
                })
            }
            Err(AppError::UnknownAccount) => {
                self.navigate_with_notice(&Route::Register.path(), Some(AppError::UnknownAccount.to_string()))
            }
            Err(e) if e.is_user_facing() => {
                log::info!("{} on {} failed: {}", request.action, route, e);
                self.navigate_with_notice(&request.path, Some(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn perform(&self, route: &Route, session: Option<&Session>, action: Action) -> Result<Outcome> {
        // 除登录、注册、登出外都需要会话
        let user_id = || session.map(|s| s.user_id.clone()).ok_or(AppError::NotAuthenticated);

        let outcome = match action {
            Action::Logout => {
                self.auth.logout()?;
                Outcome::to(Route::Home)
            }
            Action::Login { email, password } => {
                let session = self.auth.login(&email, &password).await?;
                Outcome::to(Route::Dashboard(session.role))
            }
            Action::Register {
                name,
                email,
                password,
                role,
            } => {
                let user = self.auth.register(&name, &email, &password, role).await?;
                let landing = if user.role == Role::Faculty { Role::Faculty } else { Role::Student };
                Outcome::to(Route::Dashboard(landing))
            }
            Action::CreateCourse { title, description } => {
                self.store.create_course(&title, &description, &user_id()?)?;
                Outcome::to(Route::Dashboard(Role::Faculty))
            }
            Action::DeleteCourse { course_id } => {
                self.store.delete_course(&course_id, &user_id()?)?;
                Outcome::to(Route::Dashboard(Role::Faculty))
            }
            Action::AddMaterial { title, url } => {
                let course_id = route_course(route)?;
                self.store.add_material(course_id, &title, &url)?;
                Outcome::to(route.clone())
            }
            Action::DeleteMaterial { material_id } => {
                self.store.delete_material(route_course(route)?, &material_id)?;
                Outcome::to(route.clone())
            }
            Action::AddQuiz { title } => {
                self.store.add_quiz(route_course(route)?, &title)?;
                Outcome::to(route.clone())
            }
            Action::DeleteQuiz { quiz_id } => {
                self.store.delete_quiz(route_course(route)?, &quiz_id)?;
                Outcome::to(route.clone())
            }
            Action::AddQuestion {
                text,
                options,
                correct_index,
            } => {
                let (course_id, quiz_id) = route_quiz(route)?;
                // 留空按 0 处理，非数字视为越界
                let index = match correct_index.trim() {
                    "" => 0,
                    raw => raw.parse::<i64>().unwrap_or(UNANSWERED),
                };
                self.store.add_question(course_id, quiz_id, &text, &options, index)?;
                Outcome::to(route.clone())
            }
            Action::SaveQuestions { edits } => {
                let (course_id, quiz_id) = route_quiz(route)?;
                self.store.save_question_edits(course_id, quiz_id, &edits)?;
                Outcome::Navigate {
                    path: route.path(),
                    notice: Some("Quiz saved.".to_string()),
                }
            }
            Action::DeleteQuestion { question_id } => {
                let (course_id, quiz_id) = route_quiz(route)?;
                self.store.delete_question(course_id, quiz_id, &question_id)?;
                Outcome::to(route.clone())
            }
            Action::SubmitQuiz { answers } => {
                let (course_id, quiz_id) = route_quiz(route)?;
                let db = self.store.dataset()?;
                let quiz = db
                    .course(course_id)
                    .and_then(|c| c.quiz(quiz_id))
                    .ok_or(AppError::NotFound("Quiz"))?;
                let ordered: Vec<i64> = quiz
                    .questions
                    .iter()
                    .map(|q| answers.get(&q.id).copied().unwrap_or(UNANSWERED))
                    .collect();
                let report = self.store.submit_attempt(&user_id()?, course_id, quiz_id, &ordered)?;
                Outcome::Render {
                    body: views::render_quiz_results(&report),
                }
            }
            Action::ChangeRole { user_id, role } => {
                self.store.change_role(&user_id, role)?;
                Outcome::to(Route::Dashboard(Role::Admin))
            }
            Action::DeleteUser { user_id } => {
                self.store.delete_user(&user_id)?;
                Outcome::to(Route::Dashboard(Role::Admin))
            }
        };
        Ok(outcome)
    }
}

fn route_course(route: &Route) -> Result<&str> {
    match route {
        Route::Course(id) => Ok(id.as_str()),
        _ => Err(AppError::UnsupportedAction),
    }
}

fn route_quiz(route: &Route) -> Result<(&str, &str)> {
    match route {
        Route::QuizBuilder { course_id, quiz_id } | Route::Quiz { course_id, quiz_id } => {
            Ok((course_id.as_str(), quiz_id.as_str()))
        }
        _ => Err(AppError::UnsupportedAction),
    }
}
