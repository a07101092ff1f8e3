//! 页面渲染
//! 每个页面是 (数据集, 会话) 的纯函数，输出交给 WebView 显示的 HTML。
//!
//! 交互约定：`form[data-action]` 提交时由前端收集字段；`button[data-action]`
//! 点击时携带 `data-id`；带 `data-confirm` 的操作先弹出确认框；
//! `a[data-external]` 用系统浏览器打开。

mod admin;
mod faculty;
mod public;
mod student;

pub use admin::render_admin_dashboard;
pub use faculty::{render_course_detail, render_faculty_dashboard, render_quiz_builder};
pub use public::{render_home, render_leaderboard, render_login, render_not_found, render_register};
pub use student::{render_materials, render_quiz, render_quiz_results, render_student_dashboard};

use pulldown_cmark::{html, Event, Options, Parser};

use crate::models::{Role, Session};
use crate::utils::escape_html;

/// 导航栏
pub fn render_nav(session: Option<&Session>) -> String {
    let mut items = vec![
        r##"<a class="btn" href="#home">Home</a>"##.to_string(),
        r##"<a class="btn" href="#leaderboard">Leaderboard</a>"##.to_string(),
    ];
    match session {
        None => {
            items.push(r##"<a class="btn primary" href="#login">Login</a>"##.to_string());
            items.push(r##"<a class="btn" href="#register">Register</a>"##.to_string());
        }
        Some(session) => {
            items.push(format!(
                r##"<a class="btn" href="#dashboard-{}">{} Dashboard</a>"##,
                session.role,
                session.role.label()
            ));
            items.push(format!(r#"<span class="small">{}</span>"#, escape_html(&session.name)));
            items.push(r#"<button class="btn warn" data-action="logout">Logout</button>"#.to_string());
        }
    }
    items.join("")
}

/// 角色对应的仪表盘路径
pub fn dashboard_path(role: Role) -> String {
    format!("dashboard-{}", role)
}

pub(crate) fn h1(title: &str) -> String {
    format!("<h1>{}</h1>", escape_html(title))
}

pub(crate) fn empty(message: &str) -> String {
    format!(r#"<div class="empty">{}</div>"#, escape_html(message))
}

pub(crate) fn empty_row(colspan: usize, message: &str) -> String {
    format!(
        r#"<tr><td colspan="{}" class="empty">{}</td></tr>"#,
        colspan,
        escape_html(message)
    )
}

/// 行列表为空时显示占位行
pub(crate) fn rows_or_empty(rows: String, colspan: usize, message: &str) -> String {
    if rows.is_empty() {
        empty_row(colspan, message)
    } else {
        rows
    }
}

/// 课程简介按 Markdown 渲染，丢弃其中的原始 HTML
pub(crate) fn render_markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(content, options)
        .filter(|event| !matches!(event, Event::Html(_) | Event::InlineHtml(_)));
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_signed_out() {
        let nav = render_nav(None);
        assert!(nav.contains("#login"));
        assert!(nav.contains("#register"));
        assert!(!nav.contains("logout"));
    }

    #[test]
    fn test_nav_signed_in_shows_role_dashboard() {
        let session = Session {
            user_id: "u-fac".into(),
            role: Role::Faculty,
            email: "ada@example.com".into(),
            name: "<Ada>".into(),
        };
        let nav = render_nav(Some(&session));
        assert!(nav.contains(r##"href="#dashboard-faculty">Faculty Dashboard"##));
        assert!(nav.contains(r#"data-action="logout""#));
        assert!(nav.contains("&lt;Ada&gt;"));
        assert!(!nav.contains("#login"));
    }

    #[test]
    fn test_markdown_drops_raw_html() {
        let html = render_markdown("**Bold** <script>alert(1)</script>");
        assert!(html.contains("<strong>Bold</strong>"));
        assert!(!html.contains("<script>"));
    }
}
