use crate::models::{Dataset, Session};
use crate::services::store::{attempts_for_user, AttemptReport};
use crate::utils::escape_html;

use super::{empty, h1, render_markdown, render_not_found, rows_or_empty};

/// 学生仪表盘
pub fn render_student_dashboard(db: &Dataset, session: &Session) -> String {
    let Some(me) = db.user(&session.user_id) else {
        return render_not_found("Account");
    };
    let attempts = attempts_for_user(db, &me.id);

    let attempt_rows: String = attempts
        .iter()
        .map(|a| {
            let course = db.course(&a.course_id);
            let quiz = course.and_then(|c| c.quiz(&a.quiz_id));
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}/{}</td><td>{}</td></tr>",
                course.map(|c| escape_html(&c.title)).unwrap_or_else(|| "-".into()),
                quiz.map(|q| escape_html(&q.title)).unwrap_or_else(|| "-".into()),
                a.score,
                a.total,
                a.created_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect();

    let course_cards: String = db
        .courses
        .iter()
        .map(|c| {
            let quiz_links: String = c
                .quizzes
                .iter()
                .map(|q| {
                    format!(
                        r##"<a class="btn" href="#quiz/{}/{}">Attempt: {}</a>"##,
                        escape_html(&c.id),
                        escape_html(&q.id),
                        escape_html(&q.title)
                    )
                })
                .collect();
            format!(
                r##"<div class="card">
    <div class="card-head"><h3>{title}</h3><span class="badge">{count} quiz(es)</span></div>
    <div class="card-body">
      <div class="actions">
        <a class="btn" href="#materials/{id}">View Materials</a>
        {links}
      </div>
    </div>
  </div>"##,
                title = escape_html(&c.title),
                count = c.quizzes.len(),
                id = escape_html(&c.id),
                links = if quiz_links.is_empty() {
                    r#"<span class="small">No quizzes</span>"#.to_string()
                } else {
                    quiz_links
                }
            )
        })
        .collect();

    let badge_labels = me
        .badges
        .iter()
        .map(|id| escape_html(db.badge_label(id)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
  {title}
  <div class="grid cols-3">
    <div class="card"><div class="card-body"><div class="kpi">{points}</div><div class="small">Total Points</div></div></div>
    <div class="card"><div class="card-body"><div class="kpi">{badge_count}</div><div class="small">Badges</div><div class="small">{badge_labels}</div></div></div>
    <div class="card"><div class="card-body"><div class="kpi">{attempt_count}</div><div class="small">Quiz Attempts</div></div></div>
  </div>

  <h2>Courses &amp; Quizzes</h2>
  <div class="grid cols-2">{cards}</div>

  <h2>Recent Attempts</h2>
  <div class="card">
    <div class="card-body">
      <table class="table"><thead><tr><th>Course</th><th>Quiz</th><th>Score</th><th>Date</th></tr></thead>
      <tbody>{rows}</tbody></table>
    </div>
  </div>"#,
        title = h1("Student Dashboard"),
        points = me.points,
        badge_count = me.badges.len(),
        badge_labels = badge_labels,
        attempt_count = attempts.len(),
        cards = if course_cards.is_empty() { empty("No courses yet.") } else { course_cards },
        rows = rows_or_empty(attempt_rows, 4, "No attempts yet."),
    )
}

/// 答题页
pub fn render_quiz(db: &Dataset, course_id: &str, quiz_id: &str) -> String {
    let Some((course, quiz)) = db.course(course_id).and_then(|c| c.quiz(quiz_id).map(|q| (c, q))) else {
        return render_not_found("Quiz");
    };

    let questions: String = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(idx, q)| {
            let options: String = q
                .options
                .iter()
                .enumerate()
                .map(|(i, opt)| {
                    format!(
                        r#"<label class="option"><input type="radio" name="q_{}" value="{}"><span>{}</span></label>"#,
                        escape_html(&q.id),
                        i,
                        escape_html(opt)
                    )
                })
                .collect();
            format!(
                r#"<div class="card"><div class="card-body"><div><b>Q{}.</b> {}</div><div class="options">{}</div></div></div>"#,
                idx + 1,
                escape_html(&q.text),
                options
            )
        })
        .collect();

    format!(
        r##"
    {title}
    <div class="small">Course: {course}</div>
    <form data-action="submit_quiz">
      {questions}
      <div class="actions">
        <button class="btn primary" type="submit">Submit Quiz</button>
        <a class="btn ghost" href="#dashboard-student">Cancel</a>
      </div>
    </form>"##,
        title = h1(&format!("Attempt: {}", quiz.title)),
        course = escape_html(&course.title),
        questions = questions,
    )
}

/// 提交后的成绩与逐题反馈
pub fn render_quiz_results(report: &AttemptReport) -> String {
    let evaluation = &report.evaluation;
    let feedback: String = evaluation
        .feedback
        .iter()
        .enumerate()
        .map(|(i, f)| {
            format!(
                r#"<div class="card"><div class="card-body">
        <div><b>Q{}.</b> {}</div>
        <div class="small">Your answer: {}</div>
        <div class="small">Correct answer: <b>{}</b></div>
        <div class="badge {}">{}</div>
      </div></div>"#,
                i + 1,
                escape_html(&f.text),
                f.submitted.as_deref().map(escape_html).unwrap_or_else(|| "—".into()),
                f.correct.as_deref().map(escape_html).unwrap_or_else(|| "—".into()),
                if f.is_correct { "ok" } else { "warn" },
                if f.is_correct { "Correct" } else { "Incorrect" }
            )
        })
        .collect();

    let new_badges = if report.new_badges.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="small">New badges: {}</div>"#,
            report.new_badges.iter().map(|b| escape_html(b)).collect::<Vec<_>>().join(", ")
        )
    };

    format!(
        r##"
    {title}
    <div class="small">{course} / {quiz}</div>
    <div class="card">
      <div class="card-body">
        <div class="kpi">{score}/{total}</div>
        <div class="small">Points earned: {points}</div>
        <div class="small">Total points: {total_points}</div>
        {new_badges}
        <div class="actions">
          <a class="btn ok" href="#dashboard-student">Back to Dashboard</a>
          <a class="btn" href="#leaderboard">View Leaderboard</a>
        </div>
      </div>
    </div>
    <h2>Feedback</h2>
    {feedback}"##,
        title = h1("Quiz Results"),
        course = escape_html(&report.course_title),
        quiz = escape_html(&report.quiz_title),
        score = evaluation.score,
        total = evaluation.total,
        points = evaluation.points_awarded,
        total_points = report.total_points,
        new_badges = new_badges,
        feedback = feedback,
    )
}

/// 只读资料列表
pub fn render_materials(db: &Dataset, course_id: &str, back_path: &str) -> String {
    let Some(course) = db.course(course_id) else {
        return render_not_found("Course");
    };

    let items: String = course
        .materials
        .iter()
        .map(|m| {
            format!(
                r#"<tr><td>{}</td><td><a class="btn" href="{}" data-external>Open</a></td></tr>"#,
                escape_html(&m.title),
                escape_html(&m.url)
            )
        })
        .collect();

    format!(
        r##"
    {title}
    <div class="description">{description}</div>
    <div class="card">
      <div class="card-body">
        <table class="table">
          <thead><tr><th>Title</th><th></th></tr></thead>
          <tbody>{rows}</tbody>
        </table>
        <div class="actions">
          <a class="btn ghost" href="#{back}">Back</a>
        </div>
      </div>
    </div>"##,
        title = h1(&format!("Materials: {}", course.title)),
        description = render_markdown(&course.description),
        rows = rows_or_empty(items, 2, "No materials available."),
        back = escape_html(back_path),
    )
}
