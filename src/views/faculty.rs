use crate::models::{Dataset, Session};
use crate::services::store::courses_owned_by;
use crate::utils::escape_html;

use super::{empty, h1, render_markdown, render_not_found, rows_or_empty};

/// 教师仪表盘
pub fn render_faculty_dashboard(db: &Dataset, session: &Session) -> String {
    let cards: String = courses_owned_by(db, &session.user_id)
        .iter()
        .map(|c| {
            format!(
                r##"
    <div class="card">
      <div class="card-head">
        <h3>{title}</h3>
        <div class="actions">
          <a class="btn" href="#course/{id}">Open</a>
          <button class="btn warn" data-action="delete_course" data-id="{id}" data-confirm="Delete this course?">Delete</button>
        </div>
      </div>
      <div class="card-body">
        <div class="tag">{count} quizzes</div>
        <div class="tag">{materials} materials</div>
      </div>
    </div>"##,
                title = escape_html(&c.title),
                id = escape_html(&c.id),
                count = c.quizzes.len(),
                materials = c.materials.len(),
            )
        })
        .collect();

    format!(
        r#"
    {title}
    <div class="card">
      <div class="card-body">
        <form data-action="create_course">
          <div class="form-row">
            <div><label>Course Title</label><input required name="title" placeholder="e.g., Data Structures"/></div>
          </div>
          <label>Description (Markdown, optional)</label>
          <textarea rows="3" name="description"></textarea>
          <div class="actions">
            <button class="btn primary" type="submit">Add Course</button>
          </div>
        </form>
      </div>
    </div>

    <h2>Your Courses</h2>
    <div class="grid cols-2">{cards}</div>"#,
        title = h1("Faculty Dashboard"),
        cards = if cards.is_empty() {
            empty("No courses yet. Create one above.")
        } else {
            cards
        },
    )
}

/// 课程详情：资料与测验管理
pub fn render_course_detail(db: &Dataset, course_id: &str) -> String {
    let Some(c) = db.course(course_id) else {
        return render_not_found("Course");
    };

    let materials: String = c
        .materials
        .iter()
        .map(|m| {
            format!(
                r#"<tr><td><a href="{url}" data-external>{title}</a></td><td class="actions"><button class="btn warn" data-action="delete_material" data-id="{id}" data-confirm="Delete this material?">Delete</button></td></tr>"#,
                url = escape_html(&m.url),
                title = escape_html(&m.title),
                id = escape_html(&m.id),
            )
        })
        .collect();

    let quizzes: String = c
        .quizzes
        .iter()
        .map(|q| {
            format!(
                r##"<tr><td>{title}</td><td>{count}</td><td class="actions"><a class="btn" href="#quiz-builder/{course}/{id}">Edit</a><button class="btn warn" data-action="delete_quiz" data-id="{id}" data-confirm="Delete this quiz?">Delete</button></td></tr>"##,
                title = escape_html(&q.title),
                count = q.questions.len(),
                course = escape_html(&c.id),
                id = escape_html(&q.id),
            )
        })
        .collect();

    format!(
        r##"
    {title}
    <div class="description">{description}</div>

    <div class="card">
      <div class="card-body">
        <h3>Upload Material</h3>
        <form data-action="add_material">
          <div class="form-row">
            <div><label>Title</label><input required name="title" placeholder="e.g., Week 1 Slides"/></div>
            <div><label>URL</label><input required type="url" name="url" placeholder="https://..."/></div>
          </div>
          <div class="actions">
            <button class="btn primary" type="submit">Add Material</button>
          </div>
        </form>
      </div>
    </div>

    <h2>Materials</h2>
    <div class="card">
      <div class="card-body">
        <table class="table">
          <thead><tr><th>Title</th><th>Actions</th></tr></thead>
          <tbody>{materials}</tbody>
        </table>
      </div>
    </div>

    <div class="card">
      <div class="card-body">
        <form data-action="add_quiz">
          <div class="form-row">
            <div><label>Quiz Title</label><input required name="title" placeholder="e.g., Week 1 Quiz"/></div>
          </div>
          <div class="actions">
            <button class="btn primary" type="submit">Add Quiz</button>
            <a class="btn ghost" href="#dashboard-faculty">Back</a>
          </div>
        </form>
      </div>
    </div>

    <h2>Quizzes</h2>
    <div class="card">
      <div class="card-body">
        <table class="table">
          <thead><tr><th>Title</th><th># Questions</th><th>Actions</th></tr></thead>
          <tbody>{quizzes}</tbody>
        </table>
      </div>
    </div>"##,
        title = h1(&format!("Course: {}", c.title)),
        description = render_markdown(&c.description),
        materials = rows_or_empty(materials, 2, "No materials yet."),
        quizzes = rows_or_empty(quizzes, 3, "No quizzes yet."),
    )
}

/// 测验编辑器
pub fn render_quiz_builder(db: &Dataset, course_id: &str, quiz_id: &str) -> String {
    let Some((c, q)) = db.course(course_id).and_then(|c| c.quiz(quiz_id).map(|q| (c, q))) else {
        return render_not_found("Quiz");
    };

    let rows: String = q
        .questions
        .iter()
        .enumerate()
        .map(|(idx, ques)| {
            let max = ques.options.len().saturating_sub(1);
            format!(
                r#"
  <div class="card" data-question="{id}">
    <div class="card-body">
      <div class="form-row">
        <div>
          <label>Question {number}</label>
          <input name="{id}.text" value="{text}"/>
        </div>
        <div>
          <label>Correct Option Index (0-{max})</label>
          <input type="number" min="0" max="{max}" name="{id}.correctIndex" value="{correct}"/>
        </div>
      </div>
      <label>Options (one per line)</label>
      <textarea rows="3" name="{id}.options">{options}</textarea>
      <div class="actions">
        <button class="btn warn" type="button" data-action="delete_question" data-id="{id}" data-confirm="Delete this question?">Delete Question</button>
      </div>
    </div>
  </div>"#,
                id = escape_html(&ques.id),
                number = idx + 1,
                text = escape_html(&ques.text),
                max = max,
                correct = ques.correct_index,
                options = escape_html(&ques.options.join("\n")),
            )
        })
        .collect();

    let edit_form = if rows.is_empty() {
        empty("No questions yet.")
    } else {
        format!(
            r##"<form data-action="save_questions">
    {rows}
    <div class="actions">
      <button class="btn ok" type="submit">Save Changes</button>
      <a class="btn ghost" href="#course/{course}">Back to Course</a>
    </div>
    </form>"##,
            rows = rows,
            course = escape_html(&c.id),
        )
    };

    format!(
        r##"
    {title}
    <div class="card">
      <div class="card-body">
        <form data-action="add_question">
          <div class="form-row">
            <div><label>Question Text</label><input name="text" required placeholder="Type the question"/></div>
            <div><label>Options (comma separated)</label><input name="options" required placeholder="A,B,C,D"/></div>
          </div>
          <div class="form-row">
            <div><label>Correct Option Index (0-based)</label><input name="correctIndex" type="number" min="0" value="0"/></div>
          </div>
          <div class="actions">
            <button class="btn primary" type="submit">Add Question</button>
            <a class="btn ghost" href="#course/{course}">Done</a>
          </div>
        </form>
      </div>
    </div>

    <h2>Questions</h2>
    {edit_form}"##,
        title = h1(&format!("Edit Quiz: {}", q.title)),
        course = escape_html(&c.id),
        edit_form = edit_form,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn ada() -> Session {
        Session {
            user_id: "u-fac".into(),
            role: Role::Faculty,
            email: "ada@example.com".into(),
            name: "Prof. Ada".into(),
        }
    }

    #[test]
    fn test_dashboard_lists_only_own_courses() {
        let mut db = Dataset::seed();
        let mut other = db.courses[0].clone();
        other.id = "c-other".into();
        other.faculty_id = "u-someone".into();
        db.courses.push(other);

        let html = render_faculty_dashboard(&db, &ada());
        assert!(html.contains("#course/c-js"));
        assert!(!html.contains("c-other"));
        assert!(html.contains(r#"data-action="delete_course" data-id="c-js" data-confirm="#));
    }

    #[test]
    fn test_course_detail_actions() {
        let html = render_course_detail(&Dataset::seed(), "c-js");
        assert!(html.contains(r#"data-action="add_material""#));
        assert!(html.contains(r#"data-action="add_quiz""#));
        assert!(html.contains("#quiz-builder/c-js/q-js-1"));
        assert!(html.contains(r#"data-action="delete_quiz" data-id="q-js-1""#));
        assert!(render_course_detail(&Dataset::seed(), "c-missing").contains("Course not found."));
    }

    #[test]
    fn test_builder_prefills_question_fields() {
        let db = Dataset::seed();
        let quiz = db.course("c-js").unwrap().quiz("q-js-1").unwrap();
        let html = render_quiz_builder(&db, "c-js", "q-js-1");
        let id = &quiz.questions[0].id;

        assert!(html.contains(&format!(r#"name="{}.correctIndex" value="3""#, id)));
        assert!(html.contains("var\nlet\nconst\nall of the above"));
        assert!(html.contains("Correct Option Index (0-3)"));
        assert!(html.contains(r#"data-action="save_questions""#));
    }

    #[test]
    fn test_builder_without_questions() {
        let mut db = Dataset::seed();
        db.course_mut("c-js").unwrap().quizzes[0].questions.clear();
        let html = render_quiz_builder(&db, "c-js", "q-js-1");
        assert!(html.contains("No questions yet."));
        assert!(!html.contains(r#"data-action="save_questions""#));
    }
}
