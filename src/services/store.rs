// 领域存储服务
// 所有修改都是 读取 -> 修改 -> 整体写回；闭包返回错误时不写回

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Attempt, Course, Dataset, Material, Question, Quiz, Role, User};
use crate::services::scoring::{self, Evaluation};
use crate::services::storage::StorageAdapter;
use crate::utils::{new_id, new_prefixed_id};

/// 题目批量编辑的单条输入，字段缺失表示保持原值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEdit {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    /// 每行一个选项
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub correct_index: Option<String>,
}

/// 一次测验提交的完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptReport {
    pub attempt: Attempt,
    pub evaluation: Evaluation,
    pub course_title: String,
    pub quiz_title: String,
    /// 本次新获得的徽章名称
    pub new_badges: Vec<String>,
    pub total_points: u32,
}

/// 领域存储
#[derive(Clone)]
pub struct DomainStore {
    storage: StorageAdapter,
}

impl DomainStore {
    pub fn new(storage: StorageAdapter) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &StorageAdapter {
        &self.storage
    }

    /// 当前数据集（必要时写入种子数据）
    pub fn dataset(&self) -> Result<Dataset> {
        self.storage.load_or_seed()
    }

    /// 读-改-写，闭包成功后整体保存
    pub fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Dataset) -> Result<T>,
    {
        let mut dataset = self.storage.load_or_seed()?;
        let value = f(&mut dataset)?;
        self.storage.save(&dataset)?;
        Ok(value)
    }

    // ==================== 课程管理 ====================

    /// 创建课程
    pub fn create_course(&self, title: &str, description: &str, faculty_id: &str) -> Result<Course> {
        let title = required(title, "Course title")?;
        let course = Course {
            id: new_prefixed_id("c"),
            title: title.to_string(),
            description: description.trim().to_string(),
            faculty_id: faculty_id.to_string(),
            materials: Vec::new(),
            quizzes: Vec::new(),
        };
        self.mutate(|db| {
            db.courses.push(course.clone());
            Ok(())
        })?;
        log::info!("course {} created by {}", course.id, faculty_id);
        Ok(course)
    }

    /// 删除课程，只有所属教师可以删除；不匹配时不做任何修改
    pub fn delete_course(&self, course_id: &str, faculty_id: &str) -> Result<bool> {
        let mut dataset = self.dataset()?;
        let Some(idx) = dataset
            .courses
            .iter()
            .position(|c| c.id == course_id && c.faculty_id == faculty_id)
        else {
            log::warn!("course {} not deleted: not owned by {}", course_id, faculty_id);
            return Ok(false);
        };
        dataset.courses.remove(idx);
        self.storage.save(&dataset)?;
        log::info!("course {} deleted", course_id);
        Ok(true)
    }

    // ==================== 课程资料 ====================

    pub fn add_material(&self, course_id: &str, title: &str, url: &str) -> Result<Material> {
        let material = Material {
            id: new_id(),
            title: required(title, "Title")?.to_string(),
            url: required(url, "URL")?.to_string(),
        };
        self.mutate(|db| {
            let course = db.course_mut(course_id).ok_or(AppError::NotFound("Course"))?;
            course.materials.push(material.clone());
            Ok(())
        })?;
        log::info!("material {} added to course {}", material.id, course_id);
        Ok(material)
    }

    pub fn delete_material(&self, course_id: &str, material_id: &str) -> Result<()> {
        self.mutate(|db| {
            let course = db.course_mut(course_id).ok_or(AppError::NotFound("Course"))?;
            let idx = course
                .materials
                .iter()
                .position(|m| m.id == material_id)
                .ok_or(AppError::NotFound("Material"))?;
            course.materials.remove(idx);
            Ok(())
        })?;
        log::info!("material {} deleted from course {}", material_id, course_id);
        Ok(())
    }

    // ==================== 测验管理 ====================

    pub fn add_quiz(&self, course_id: &str, title: &str) -> Result<Quiz> {
        let quiz = Quiz {
            id: new_prefixed_id("q"),
            title: required(title, "Quiz title")?.to_string(),
            questions: Vec::new(),
        };
        self.mutate(|db| {
            let course = db.course_mut(course_id).ok_or(AppError::NotFound("Course"))?;
            course.quizzes.push(quiz.clone());
            Ok(())
        })?;
        log::info!("quiz {} added to course {}", quiz.id, course_id);
        Ok(quiz)
    }

    pub fn delete_quiz(&self, course_id: &str, quiz_id: &str) -> Result<()> {
        self.mutate(|db| {
            let course = db.course_mut(course_id).ok_or(AppError::NotFound("Course"))?;
            let idx = course
                .quizzes
                .iter()
                .position(|q| q.id == quiz_id)
                .ok_or(AppError::NotFound("Quiz"))?;
            course.quizzes.remove(idx);
            Ok(())
        })?;
        log::info!("quiz {} deleted from course {}", quiz_id, course_id);
        Ok(())
    }

    // ==================== 题目管理 ====================

    /// 添加题目，选项以逗号分隔；正确答案下标越界时拒绝
    pub fn add_question(
        &self,
        course_id: &str,
        quiz_id: &str,
        text: &str,
        options: &str,
        correct_index: i64,
    ) -> Result<Question> {
        let text = required(text, "Question text")?;
        let options = parse_options(options, ',');
        if correct_index < 0 || correct_index as usize >= options.len() {
            return Err(AppError::InvalidAnswerIndex {
                index: correct_index,
                len: options.len(),
            });
        }

        let question = Question {
            id: new_id(),
            text: text.to_string(),
            options,
            correct_index: correct_index as usize,
        };
        self.mutate(|db| {
            let quiz = quiz_mut(db, course_id, quiz_id)?;
            quiz.questions.push(question.clone());
            Ok(())
        })?;
        log::info!("question {} added to quiz {}", question.id, quiz_id);
        Ok(question)
    }

    /// 批量保存题目修改
    ///
    /// 与添加不同，这里对越界或无法解析的正确答案下标不报错，而是重置为 0。
    pub fn save_question_edits(&self, course_id: &str, quiz_id: &str, edits: &[QuestionEdit]) -> Result<usize> {
        let updated = self.mutate(|db| {
            let quiz = quiz_mut(db, course_id, quiz_id)?;
            let mut updated = 0;
            for question in quiz.questions.iter_mut() {
                let Some(edit) = edits.iter().find(|e| e.id == question.id) else {
                    continue;
                };
                apply_edit(question, edit);
                updated += 1;
            }
            Ok(updated)
        })?;
        log::info!("saved {} question edit(s) on quiz {}", updated, quiz_id);
        Ok(updated)
    }

    pub fn delete_question(&self, course_id: &str, quiz_id: &str, question_id: &str) -> Result<()> {
        self.mutate(|db| {
            let quiz = quiz_mut(db, course_id, quiz_id)?;
            let idx = quiz
                .questions
                .iter()
                .position(|q| q.id == question_id)
                .ok_or(AppError::NotFound("Question"))?;
            quiz.questions.remove(idx);
            Ok(())
        })?;
        log::info!("question {} deleted from quiz {}", question_id, quiz_id);
        Ok(())
    }

    // ==================== 用户管理 ====================

    /// 直接覆盖角色
    pub fn change_role(&self, user_id: &str, role: Role) -> Result<()> {
        self.mutate(|db| {
            let user = db.user_mut(user_id).ok_or(AppError::NotFound("User"))?;
            user.role = role;
            Ok(())
        })?;
        log::info!("user {} is now {}", user_id, role);
        Ok(())
    }

    /// 删除用户及其全部答题记录，返回删除的记录数
    pub fn delete_user(&self, user_id: &str) -> Result<usize> {
        let removed = self.mutate(|db| {
            let idx = db
                .users
                .iter()
                .position(|u| u.id == user_id)
                .ok_or(AppError::NotFound("User"))?;
            db.users.remove(idx);
            let before = db.attempts.len();
            db.attempts.retain(|a| a.user_id != user_id);
            Ok(before - db.attempts.len())
        })?;
        log::info!("user {} deleted with {} attempt(s)", user_id, removed);
        Ok(removed)
    }

    // ==================== 答题 ====================

    /// 判分、加分、发放徽章并追加答题记录
    pub fn submit_attempt(
        &self,
        user_id: &str,
        course_id: &str,
        quiz_id: &str,
        answers: &[i64],
    ) -> Result<AttemptReport> {
        let report = self.mutate(|db| {
            let course = db.course(course_id).ok_or(AppError::NotFound("Course"))?;
            let quiz = course.quiz(quiz_id).ok_or(AppError::NotFound("Quiz"))?;
            let evaluation = scoring::evaluate(quiz, answers);
            let course_title = course.title.clone();
            let quiz_title = quiz.title.clone();

            let badges = db.badges.clone();
            let user = db.user_mut(user_id).ok_or(AppError::NotFound("User"))?;
            let earned = scoring::award(user, evaluation.points_awarded, &badges);
            let total_points = user.points;

            let attempt = Attempt {
                id: new_id(),
                user_id: user_id.to_string(),
                quiz_id: quiz_id.to_string(),
                course_id: course_id.to_string(),
                score: evaluation.score,
                total: evaluation.total,
                answers: evaluation.answers.clone(),
                created_at: Utc::now(),
            };
            db.attempts.push(attempt.clone());

            let new_badges = earned.iter().map(|id| db.badge_label(id).to_string()).collect();
            Ok(AttemptReport {
                attempt,
                evaluation,
                course_title,
                quiz_title,
                new_badges,
                total_points,
            })
        })?;
        log::info!(
            "user {} scored {}/{} on quiz {} (+{} points)",
            user_id,
            report.evaluation.score,
            report.evaluation.total,
            quiz_id,
            report.evaluation.points_awarded
        );
        Ok(report)
    }
}

// ==================== 查询 ====================

/// 排行榜：仅学生，积分降序，同分保持原有顺序
pub fn leaderboard(dataset: &Dataset, limit: usize) -> Vec<&User> {
    let mut students: Vec<&User> = dataset.users.iter().filter(|u| u.role == Role::Student).collect();
    students.sort_by(|a, b| b.points.cmp(&a.points));
    students.truncate(limit);
    students
}

/// 用户的答题记录，最新的在前
pub fn attempts_for_user<'a>(dataset: &'a Dataset, user_id: &str) -> Vec<&'a Attempt> {
    let mut attempts: Vec<&Attempt> = dataset.attempts.iter().filter(|a| a.user_id == user_id).collect();
    attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    attempts
}

/// 教师名下的课程
pub fn courses_owned_by<'a>(dataset: &'a Dataset, faculty_id: &str) -> Vec<&'a Course> {
    dataset.courses.iter().filter(|c| c.faculty_id == faculty_id).collect()
}

/// 按分隔符拆分选项，去掉首尾空白与空项
pub fn parse_options(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ==================== 辅助方法 ====================

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::MissingField(field));
    }
    Ok(value)
}

fn quiz_mut<'a>(db: &'a mut Dataset, course_id: &str, quiz_id: &str) -> Result<&'a mut Quiz> {
    db.course_mut(course_id)
        .ok_or(AppError::NotFound("Course"))?
        .quiz_mut(quiz_id)
        .ok_or(AppError::NotFound("Quiz"))
}

fn apply_edit(question: &mut Question, edit: &QuestionEdit) {
    if let Some(text) = &edit.text {
        question.text = text.clone();
    }
    if let Some(options) = &edit.options {
        question.options = parse_options(options, '\n');
    }
    if let Some(raw) = &edit.correct_index {
        question.correct_index = raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|idx| usize::try_from(idx).ok())
            .unwrap_or(0);
    }
    if question.correct_index >= question.options.len() {
        question.correct_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DomainStore {
        DomainStore::new(StorageAdapter::open_in_memory().unwrap())
    }

    fn seeded_question_ids(store: &DomainStore) -> Vec<String> {
        let db = store.dataset().unwrap();
        db.course("c-js").unwrap().quiz("q-js-1").unwrap().questions.iter().map(|q| q.id.clone()).collect()
    }

    #[test]
    fn test_create_and_delete_course_by_owner_only() {
        let store = store();
        let course = store.create_course("  Data Structures ", "", "u-fac").unwrap();
        assert_eq!(course.title, "Data Structures");
        assert_eq!(store.dataset().unwrap().courses.len(), 2);

        assert!(!store.delete_course(&course.id, "u-other").unwrap());
        assert_eq!(store.dataset().unwrap().courses.len(), 2);

        assert!(store.delete_course(&course.id, "u-fac").unwrap());
        assert!(store.dataset().unwrap().course(&course.id).is_none());
    }

    #[test]
    fn test_create_course_requires_title() {
        let store = store();
        assert!(matches!(store.create_course("  ", "", "u-fac"), Err(AppError::MissingField(_))));
    }

    #[test]
    fn test_materials_and_quizzes() {
        let store = store();
        let material = store.add_material("c-js", "Week 2", "https://example.com/w2").unwrap();
        let quiz = store.add_quiz("c-js", "Week 2 Quiz").unwrap();
        assert!(quiz.id.starts_with("q-"));

        let db = store.dataset().unwrap();
        let course = db.course("c-js").unwrap();
        assert_eq!(course.materials.len(), 2);
        assert!(course.quiz(&quiz.id).unwrap().questions.is_empty());

        store.delete_material("c-js", &material.id).unwrap();
        store.delete_quiz("c-js", &quiz.id).unwrap();
        let db = store.dataset().unwrap();
        assert_eq!(db.course("c-js").unwrap().materials.len(), 1);
        assert_eq!(db.course("c-js").unwrap().quizzes.len(), 1);
    }

    #[test]
    fn test_missing_course_is_not_found() {
        let store = store();
        assert!(matches!(store.add_quiz("c-missing", "Quiz"), Err(AppError::NotFound("Course"))));
        assert!(matches!(store.delete_quiz("c-js", "q-missing"), Err(AppError::NotFound("Quiz"))));
    }

    #[test]
    fn test_add_question_parses_comma_options() {
        let store = store();
        let question = store.add_question("c-js", "q-js-1", "2 + 2?", " 3, 4 ,, 5 ", 1).unwrap();
        assert_eq!(question.options, vec!["3", "4", "5"]);
        assert_eq!(question.correct_option(), Some("4"));
        assert_eq!(seeded_question_ids(&store).len(), 3);
    }

    #[test]
    fn test_add_question_rejects_out_of_range_index() {
        let store = store();
        let before = store.dataset().unwrap();

        let err = store.add_question("c-js", "q-js-1", "Pick", "A,B", 2).unwrap_err();
        assert!(matches!(err, AppError::InvalidAnswerIndex { index: 2, len: 2 }));
        let err = store.add_question("c-js", "q-js-1", "Pick", "A,B", -1).unwrap_err();
        assert!(matches!(err, AppError::InvalidAnswerIndex { .. }));

        assert_eq!(store.dataset().unwrap(), before);
    }

    // 编辑时越界下标重置为 0，而不是像添加时那样报错
    #[test]
    fn test_edit_clamps_out_of_range_index_instead_of_rejecting() {
        let store = store();
        let ids = seeded_question_ids(&store);

        let edits = vec![
            QuestionEdit {
                id: ids[0].clone(),
                correct_index: Some("9".into()),
                ..Default::default()
            },
            QuestionEdit {
                id: ids[1].clone(),
                text: Some("Arrays are?".into()),
                options: Some("Mutable\n\n  Immutable \n".into()),
                correct_index: Some("1".into()),
            },
            QuestionEdit {
                id: "unknown".into(),
                text: Some("ignored".into()),
                ..Default::default()
            },
        ];
        assert_eq!(store.save_question_edits("c-js", "q-js-1", &edits).unwrap(), 2);

        let db = store.dataset().unwrap();
        let questions = &db.course("c-js").unwrap().quiz("q-js-1").unwrap().questions;
        assert_eq!(questions[0].correct_index, 0);
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(questions[1].text, "Arrays are?");
        assert_eq!(questions[1].options, vec!["Mutable", "Immutable"]);
        assert_eq!(questions[1].correct_index, 1);
    }

    #[test]
    fn test_edit_shrinking_options_clamps_existing_index() {
        let store = store();
        let ids = seeded_question_ids(&store);
        let edits = vec![QuestionEdit {
            id: ids[0].clone(),
            options: Some("var\nlet".into()),
            ..Default::default()
        }];
        store.save_question_edits("c-js", "q-js-1", &edits).unwrap();

        let db = store.dataset().unwrap();
        assert_eq!(db.course("c-js").unwrap().quiz("q-js-1").unwrap().questions[0].correct_index, 0);
    }

    #[test]
    fn test_delete_question() {
        let store = store();
        let ids = seeded_question_ids(&store);
        store.delete_question("c-js", "q-js-1", &ids[0]).unwrap();
        assert_eq!(seeded_question_ids(&store), vec![ids[1].clone()]);
    }

    #[test]
    fn test_change_role_overwrites() {
        let store = store();
        store.change_role("u-stu", Role::Faculty).unwrap();
        assert_eq!(store.dataset().unwrap().user("u-stu").unwrap().role, Role::Faculty);
    }

    #[test]
    fn test_delete_user_removes_only_their_attempts() {
        let store = store();
        store.mutate(|db| {
            db.users.push(User {
                id: "u-other".into(),
                name: "Other".into(),
                email: "other@example.com".into(),
                pass_hash: None,
                role: Role::Student,
                points: 0,
                badges: Vec::new(),
            });
            Ok(())
        })
        .unwrap();
        store.submit_attempt("u-stu", "c-js", "q-js-1", &[3, 1]).unwrap();
        store.submit_attempt("u-other", "c-js", "q-js-1", &[0, 0]).unwrap();
        store.submit_attempt("u-stu", "c-js", "q-js-1", &[0, 1]).unwrap();

        assert_eq!(store.delete_user("u-stu").unwrap(), 2);
        let db = store.dataset().unwrap();
        assert!(db.user("u-stu").is_none());
        assert_eq!(db.attempts.len(), 1);
        assert_eq!(db.attempts[0].user_id, "u-other");
    }

    #[test]
    fn test_submit_attempt_scores_and_awards() {
        let store = store();
        let report = store.submit_attempt("u-stu", "c-js", "q-js-1", &[3, 1]).unwrap();

        assert_eq!(report.evaluation.score, 2);
        assert_eq!(report.evaluation.points_awarded, 20);
        assert_eq!(report.total_points, 40);
        assert!(report.new_badges.is_empty());

        let db = store.dataset().unwrap();
        assert_eq!(db.user("u-stu").unwrap().points, 40);
        assert_eq!(db.attempts.len(), 1);
        assert_eq!(db.attempts[0].answers, vec![3, 1]);
    }

    #[test]
    fn test_five_correct_from_zero_crosses_two_thresholds() {
        let store = store();
        let quiz = store.add_quiz("c-js", "Five").unwrap();
        for _ in 0..5 {
            store.add_question("c-js", &quiz.id, "Pick A", "A,B", 0).unwrap();
        }
        store.change_role("u-fac", Role::Student).unwrap();

        let report = store.submit_attempt("u-fac", "c-js", &quiz.id, &[0, 0, 0, 0, 0]).unwrap();
        assert_eq!(report.evaluation.points_awarded, 50);
        assert_eq!(report.new_badges, vec!["Starter".to_string(), "Bronze Brain".to_string()]);

        let db = store.dataset().unwrap();
        assert_eq!(db.user("u-fac").unwrap().badges, vec!["starter".to_string(), "bronze".to_string()]);
    }

    #[test]
    fn test_submit_missing_quiz_persists_nothing() {
        let store = store();
        let before = store.dataset().unwrap();
        assert!(store.submit_attempt("u-stu", "c-js", "q-missing", &[]).is_err());
        assert_eq!(store.dataset().unwrap(), before);
    }

    #[test]
    fn test_leaderboard_students_only_sorted_and_capped() {
        let mut db = Dataset::seed();
        for i in 0..12u32 {
            db.users.push(User {
                id: format!("u-{}", i),
                name: format!("S{}", i),
                email: format!("s{}@example.com", i),
                pass_hash: None,
                role: Role::Student,
                points: if i < 2 { 100 } else { i },
                badges: Vec::new(),
            });
        }
        db.user_mut("u-admin").unwrap().points = 1000;

        let board = leaderboard(&db, 10);
        assert_eq!(board.len(), 10);
        assert!(board.iter().all(|u| u.role == Role::Student));
        // 同分按插入顺序
        assert_eq!(board[0].id, "u-0");
        assert_eq!(board[1].id, "u-1");
        assert_eq!(board[2].id, "u-stu");
        assert!(board.windows(2).all(|w| w[0].points >= w[1].points));
    }

    #[test]
    fn test_attempts_for_user_newest_first() {
        let store = store();
        store.submit_attempt("u-stu", "c-js", "q-js-1", &[0, 0]).unwrap();
        store.submit_attempt("u-stu", "c-js", "q-js-1", &[3, 1]).unwrap();
        let db = store.dataset().unwrap();
        let attempts = attempts_for_user(&db, "u-stu");
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].created_at >= attempts[1].created_at);
    }
}
