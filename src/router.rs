//! 路由
//! 片段路径与 Route 的互相转换，以及按角色的访问控制

use std::fmt;

use crate::models::{Role, Session};

/// 所有可导航页面
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Leaderboard,
    Dashboard(Role),
    Course(String),
    QuizBuilder { course_id: String, quiz_id: String },
    Quiz { course_id: String, quiz_id: String },
    Materials(String),
    NotFound(String),
}

/// 访问要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

/// 守卫结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Allow,
    Redirect(Route),
}

impl Route {
    /// 解析片段路径，空路径为首页
    pub fn parse(path: &str) -> Self {
        let path = path.trim().trim_start_matches('#');
        if path.is_empty() {
            return Route::Home;
        }

        let segments: Vec<&str> = path.split('/').collect();
        let id = |i: usize| segments.get(i).filter(|s| !s.is_empty()).map(|s| s.to_string());

        let route = match segments[0] {
            "home" if segments.len() == 1 => Some(Route::Home),
            "login" if segments.len() == 1 => Some(Route::Login),
            "register" if segments.len() == 1 => Some(Route::Register),
            "leaderboard" if segments.len() == 1 => Some(Route::Leaderboard),
            "dashboard-student" if segments.len() == 1 => Some(Route::Dashboard(Role::Student)),
            "dashboard-faculty" if segments.len() == 1 => Some(Route::Dashboard(Role::Faculty)),
            "dashboard-admin" if segments.len() == 1 => Some(Route::Dashboard(Role::Admin)),
            "course" if segments.len() == 2 => id(1).map(Route::Course),
            "materials" if segments.len() == 2 => id(1).map(Route::Materials),
            "quiz-builder" if segments.len() == 3 => id(1)
                .zip(id(2))
                .map(|(course_id, quiz_id)| Route::QuizBuilder { course_id, quiz_id }),
            "quiz" if segments.len() == 3 => id(1)
                .zip(id(2))
                .map(|(course_id, quiz_id)| Route::Quiz { course_id, quiz_id }),
            _ => None,
        };
        route.unwrap_or_else(|| Route::NotFound(path.to_string()))
    }

    /// 规范路径（不带 #）
    pub fn path(&self) -> String {
        match self {
            Route::Home => "home".to_string(),
            Route::Login => "login".to_string(),
            Route::Register => "register".to_string(),
            Route::Leaderboard => "leaderboard".to_string(),
            Route::Dashboard(role) => format!("dashboard-{}", role),
            Route::Course(id) => format!("course/{}", id),
            Route::QuizBuilder { course_id, quiz_id } => format!("quiz-builder/{}/{}", course_id, quiz_id),
            Route::Quiz { course_id, quiz_id } => format!("quiz/{}/{}", course_id, quiz_id),
            Route::Materials(id) => format!("materials/{}", id),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Home | Route::Login | Route::Register | Route::Leaderboard => Access::Public,
            Route::Dashboard(role) => Access::Role(*role),
            Route::Course(_) | Route::QuizBuilder { .. } => Access::Role(Role::Faculty),
            Route::Quiz { .. } => Access::Role(Role::Student),
            Route::Materials(_) | Route::NotFound(_) => Access::Authenticated,
        }
    }

    /// 未登录访问受保护页面跳转登录，角色不符跳转首页
    pub fn guard(&self, session: Option<&Session>) -> Guard {
        match (self.access(), session) {
            (Access::Public, _) => Guard::Allow,
            (_, None) => Guard::Redirect(Route::Login),
            (Access::Authenticated, Some(_)) => Guard::Allow,
            (Access::Role(role), Some(session)) if session.role == role => Guard::Allow,
            (Access::Role(_), Some(_)) => Guard::Redirect(Route::Home),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session {
            user_id: "u-1".into(),
            role,
            email: "x@example.com".into(),
            name: "X".into(),
        }
    }

    #[test]
    fn test_parse_known_paths() {
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("#leaderboard"), Route::Leaderboard);
        assert_eq!(Route::parse("dashboard-admin"), Route::Dashboard(Role::Admin));
        assert_eq!(Route::parse("course/c-js"), Route::Course("c-js".into()));
        assert_eq!(
            Route::parse("quiz-builder/c-js/q-js-1"),
            Route::QuizBuilder {
                course_id: "c-js".into(),
                quiz_id: "q-js-1".into()
            }
        );
        assert_eq!(
            Route::parse("quiz/c-js/q-js-1"),
            Route::Quiz {
                course_id: "c-js".into(),
                quiz_id: "q-js-1".into()
            }
        );
        assert_eq!(Route::parse("materials/c-js"), Route::Materials("c-js".into()));
    }

    #[test]
    fn test_parse_unknown_and_malformed_paths() {
        assert_eq!(Route::parse("nowhere"), Route::NotFound("nowhere".into()));
        assert_eq!(Route::parse("course/"), Route::NotFound("course/".into()));
        assert_eq!(Route::parse("quiz/c-js"), Route::NotFound("quiz/c-js".into()));
        assert_eq!(Route::parse("home/extra"), Route::NotFound("home/extra".into()));
    }

    #[test]
    fn test_path_round_trip() {
        for path in [
            "home",
            "login",
            "register",
            "leaderboard",
            "dashboard-student",
            "dashboard-faculty",
            "dashboard-admin",
            "course/c-1",
            "quiz-builder/c-1/q-1",
            "quiz/c-1/q-1",
            "materials/c-1",
        ] {
            assert_eq!(Route::parse(path).path(), path);
        }
    }

    #[test]
    fn test_public_routes_allow_anyone() {
        for route in [Route::Home, Route::Login, Route::Register, Route::Leaderboard] {
            assert_eq!(route.guard(None), Guard::Allow);
        }
    }

    #[test]
    fn test_guard_redirects() {
        let quiz = Route::parse("quiz/c-js/q-js-1");
        assert_eq!(quiz.guard(None), Guard::Redirect(Route::Login));
        assert_eq!(quiz.guard(Some(&session(Role::Faculty))), Guard::Redirect(Route::Home));
        assert_eq!(quiz.guard(Some(&session(Role::Student))), Guard::Allow);

        let builder = Route::parse("quiz-builder/c-js/q-js-1");
        assert_eq!(builder.guard(Some(&session(Role::Admin))), Guard::Redirect(Route::Home));
        assert_eq!(builder.guard(Some(&session(Role::Faculty))), Guard::Allow);

        let admin = Route::Dashboard(Role::Admin);
        assert_eq!(admin.guard(Some(&session(Role::Student))), Guard::Redirect(Route::Home));
    }

    #[test]
    fn test_unknown_path_requires_sign_in() {
        let route = Route::parse("nowhere");
        assert_eq!(route.guard(None), Guard::Redirect(Route::Login));
        assert_eq!(route.guard(Some(&session(Role::Admin))), Guard::Allow);
    }

    #[test]
    fn test_materials_open_to_any_signed_in_role() {
        let route = Route::Materials("c-js".into());
        assert_eq!(route.guard(None), Guard::Redirect(Route::Login));
        for role in [Role::Student, Role::Faculty, Role::Admin] {
            assert_eq!(route.guard(Some(&session(role))), Guard::Allow);
        }
    }
}
