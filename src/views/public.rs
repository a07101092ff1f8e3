use crate::models::Dataset;
use crate::services::store::leaderboard;
use crate::utils::escape_html;

use super::{empty, h1, rows_or_empty};

/// 首页
pub fn render_home(db: &Dataset) -> String {
    format!(
        r##"
  <div class="grid cols-2">
    <section class="card">
      <div class="card-head"><h2>Welcome</h2></div>
      <div class="card-body">
        <p class="lead">A local E-Learning Platform with gamification: authentication, role-based access, course &amp; quiz management, instant evaluation, points, badges, and a leaderboard.</p>
        <p class="small">Try logging in as: <br/>
        <code>admin@example.com</code> (admin), <code>ada@example.com</code> (faculty), <code>sam@example.com</code> (student). The first password you enter at Login becomes the account password.</p>
        <div class="actions">
          <a class="btn primary" href="#register">Get Started</a>
          <a class="btn ghost" href="#login">I have an account</a>
        </div>
      </div>
    </section>
    <section class="card">
      <div class="card-head"><h2>At a Glance</h2></div>
      <div class="card-body grid cols-2">
        <div><div class="kpi">{users}</div><div class="small">Users</div></div>
        <div><div class="kpi">{courses}</div><div class="small">Courses</div></div>
        <div><div class="kpi">{attempts}</div><div class="small">Quiz Attempts</div></div>
        <div><div class="kpi">{badges}</div><div class="small">Badges</div></div>
      </div>
    </section>
  </div>"##,
        users = db.users.len(),
        courses = db.courses.len(),
        attempts = db.attempts.len(),
        badges = db.badges.len(),
    )
}

pub fn render_login() -> String {
    format!(
        r##"
  {title}
  <div class="card">
    <div class="card-body">
      <form data-action="login" autocomplete="on">
        <label>Email</label>
        <input required type="email" name="email" placeholder="you@example.com"/>
        <label>Password</label>
        <input required type="password" name="password" placeholder="••••••••"/>
        <div class="actions">
          <button class="btn primary" type="submit">Login</button>
          <a class="btn ghost" href="#register">Create account</a>
        </div>
      </form>
    </div>
  </div>"##,
        title = h1("Login")
    )
}

pub fn render_register() -> String {
    format!(
        r##"
  {title}
  <div class="card">
    <div class="card-body">
      <form data-action="register" autocomplete="on">
        <div class="form-row">
          <div><label>Name</label><input required name="name" placeholder="Your name"/></div>
          <div><label>Email</label><input required type="email" name="email" placeholder="you@example.com"/></div>
        </div>
        <div class="form-row">
          <div><label>Password</label><input required type="password" name="password" placeholder="Choose a password"/></div>
          <div>
            <label>Role</label>
            <select name="role">
              <option value="student">Student</option>
              <option value="faculty">Faculty</option>
            </select>
          </div>
        </div>
        <div class="actions">
          <button class="btn primary" type="submit">Create account</button>
          <a class="btn ghost" href="#login">I have an account</a>
        </div>
      </form>
    </div>
  </div>"##,
        title = h1("Create an Account")
    )
}

/// 排行榜
pub fn render_leaderboard(db: &Dataset, limit: usize) -> String {
    let rows: String = leaderboard(db, limit)
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let badges = user
                .badges
                .iter()
                .map(|id| escape_html(db.badge_label(id)))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                i + 1,
                escape_html(&user.name),
                user.points,
                if badges.is_empty() { "-".to_string() } else { badges }
            )
        })
        .collect();

    format!(
        r#"
    {title}
    <div class="card">
      <div class="card-body">
        <table class="table">
          <thead><tr><th>#</th><th>Student</th><th>Points</th><th>Badges</th></tr></thead>
          <tbody>{rows}</tbody>
        </table>
      </div>
    </div>"#,
        title = h1("Leaderboard"),
        rows = rows_or_empty(rows, 4, "No students yet.")
    )
}

pub fn render_not_found(what: &str) -> String {
    empty(&format!("{} not found.", what))
}
