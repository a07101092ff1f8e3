use crate::models::{Dataset, Role};
use crate::utils::escape_html;

use super::{h1, rows_or_empty};

/// 管理员仪表盘：用户角色与删除，课程只读
pub fn render_admin_dashboard(db: &Dataset) -> String {
    let users: String = db
        .users
        .iter()
        .map(|u| {
            let id = escape_html(&u.id);
            let role_buttons: String = [Role::Student, Role::Faculty]
                .iter()
                .map(|role| {
                    format!(
                        r#"<button class="btn" data-action="change_role" data-id="{}" data-role="{}">Make {}</button>"#,
                        id,
                        role,
                        role.label()
                    )
                })
                .collect();
            format!(
                r#"
    <tr>
      <td>{name}</td>
      <td>{email}</td>
      <td><span class="tag">{role}</span></td>
      <td>{points}</td>
      <td class="actions">
        {role_buttons}
        <button class="btn warn" data-action="delete_user" data-id="{id}" data-confirm="Delete this user?">Delete</button>
      </td>
    </tr>"#,
                name = escape_html(&u.name),
                email = escape_html(&u.email),
                role = u.role,
                points = u.points,
                role_buttons = role_buttons,
                id = id,
            )
        })
        .collect();

    let courses: String = db
        .courses
        .iter()
        .map(|c| {
            let faculty = db.user(&c.faculty_id).map(|u| escape_html(&u.name));
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&c.title),
                faculty.unwrap_or_else(|| "-".into()),
                c.quizzes.len()
            )
        })
        .collect();

    format!(
        r#"
    {title}
    <div class="grid cols-2">
      <div class="card">
        <div class="card-head"><h3>Users</h3></div>
        <div class="card-body">
          <table class="table">
            <thead><tr><th>Name</th><th>Email</th><th>Role</th><th>Points</th><th>Actions</th></tr></thead>
            <tbody>{users}</tbody>
          </table>
        </div>
      </div>
      <div class="card">
        <div class="card-head"><h3>Courses</h3></div>
        <div class="card-body">
          <table class="table">
            <thead><tr><th>Title</th><th>Faculty</th><th># Quizzes</th></tr></thead>
            <tbody>{courses}</tbody>
          </table>
        </div>
      </div>
    </div>"#,
        title = h1("Admin Dashboard"),
        users = rows_or_empty(users, 5, "No users."),
        courses = rows_or_empty(courses, 3, "No courses."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_users_with_role_actions() {
        let html = render_admin_dashboard(&Dataset::seed());
        assert!(html.contains(r#"data-action="change_role" data-id="u-stu" data-role="faculty""#));
        assert!(html.contains(r#"data-action="delete_user" data-id="u-fac""#));
        assert!(html.contains("<tr><td>Intro to JavaScript</td><td>Prof. Ada</td><td>1</td></tr>"));
    }

    #[test]
    fn test_course_without_known_faculty() {
        let mut db = Dataset::seed();
        db.users.retain(|u| u.id != "u-fac");
        assert!(render_admin_dashboard(&db).contains("<td>Intro to JavaScript</td><td>-</td>"));
    }
}
