//! 判分引擎
//! 按题目顺序比对答案，计算得分与积分，并发放达到阈值的徽章

use serde::{Deserialize, Serialize};

use crate::models::{BadgeDefinition, Quiz, User};

/// 每答对一题获得的积分
pub const POINTS_PER_CORRECT: u32 = 10;

/// 未作答
pub const UNANSWERED: i64 = -1;

/// 单题反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub text: String,
    /// 所选选项文本，未作答或下标越界时为 None
    pub submitted: Option<String>,
    pub correct: Option<String>,
    pub is_correct: bool,
}

/// 一次提交的判分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u32,
    pub total: u32,
    pub points_awarded: u32,
    pub answers: Vec<i64>,
    pub feedback: Vec<QuestionFeedback>,
}

/// 判分：`submitted` 按题目顺序给出选项下标，缺失的视为未作答
pub fn evaluate(quiz: &Quiz, submitted: &[i64]) -> Evaluation {
    let mut score = 0u32;
    let mut answers = Vec::with_capacity(quiz.questions.len());
    let mut feedback = Vec::with_capacity(quiz.questions.len());

    for (i, question) in quiz.questions.iter().enumerate() {
        let chosen = submitted.get(i).copied().unwrap_or(UNANSWERED);
        let is_correct = chosen == question.correct_index as i64;
        if is_correct {
            score += 1;
        }

        let submitted_text = usize::try_from(chosen)
            .ok()
            .and_then(|idx| question.options.get(idx))
            .cloned();

        answers.push(chosen);
        feedback.push(QuestionFeedback {
            text: question.text.clone(),
            submitted: submitted_text,
            correct: question.correct_option().map(str::to_string),
            is_correct,
        });
    }

    Evaluation {
        score,
        total: quiz.questions.len() as u32,
        points_awarded: score * POINTS_PER_CORRECT,
        answers,
        feedback,
    }
}

/// 加积分并发放徽章，返回本次新获得的徽章 ID
///
/// 每次都对全部阈值重新判断，一次提交可能同时跨过多个阈值。
pub fn award(user: &mut User, points: u32, badges: &[BadgeDefinition]) -> Vec<String> {
    user.points = user.points.saturating_add(points);

    let mut earned = Vec::new();
    for badge in badges {
        if user.points >= badge.threshold && !user.has_badge(&badge.id) {
            user.badges.push(badge.id.clone());
            earned.push(badge.id.clone());
        }
    }
    earned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_badges, Question, Role};

    fn question(id: &str, correct_index: usize) -> Question {
        Question {
            id: id.into(),
            text: format!("Question {}", id),
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_index,
        }
    }

    fn quiz(correct: &[usize]) -> Quiz {
        Quiz {
            id: "q-1".into(),
            title: "Quiz".into(),
            questions: correct
                .iter()
                .enumerate()
                .map(|(i, c)| question(&i.to_string(), *c))
                .collect(),
        }
    }

    fn student(points: u32) -> User {
        User {
            id: "u-1".into(),
            name: "Stu".into(),
            email: "stu@example.com".into(),
            pass_hash: None,
            role: Role::Student,
            points,
            badges: Vec::new(),
        }
    }

    #[test]
    fn test_all_correct_two_questions() {
        let result = evaluate(&quiz(&[1, 0]), &[1, 0]);
        assert_eq!(result.score, 2);
        assert_eq!(result.total, 2);
        assert_eq!(result.points_awarded, 20);
        assert!(result.feedback.iter().all(|f| f.is_correct));
    }

    #[test]
    fn test_score_counts_matching_positions() {
        let result = evaluate(&quiz(&[0, 1, 2, 0]), &[0, 2, 2, 1]);
        assert_eq!(result.score, 2);
        assert_eq!(result.total, 4);
        assert_eq!(result.points_awarded, 20);
        assert_eq!(result.answers, vec![0, 2, 2, 1]);
    }

    #[test]
    fn test_missing_answers_are_unanswered() {
        let result = evaluate(&quiz(&[0, 1, 2]), &[0]);
        assert_eq!(result.score, 1);
        assert_eq!(result.answers, vec![0, UNANSWERED, UNANSWERED]);
        assert_eq!(result.feedback[1].submitted, None);
        assert_eq!(result.feedback[1].correct.as_deref(), Some("B"));
        assert!(!result.feedback[1].is_correct);
    }

    #[test]
    fn test_out_of_range_answer_is_wrong_without_text() {
        let result = evaluate(&quiz(&[0]), &[7]);
        assert_eq!(result.score, 0);
        assert_eq!(result.feedback[0].submitted, None);
    }

    #[test]
    fn test_empty_quiz_scores_zero() {
        let result = evaluate(&quiz(&[]), &[]);
        assert_eq!((result.score, result.total, result.points_awarded), (0, 0, 0));
    }

    #[test]
    fn test_single_pass_awards_multiple_badges() {
        let mut user = student(0);
        let earned = award(&mut user, 50, &default_badges());
        assert_eq!(user.points, 50);
        assert_eq!(earned, vec!["starter".to_string(), "bronze".to_string()]);
        assert_eq!(user.badges, earned);
    }

    #[test]
    fn test_badges_never_lost_and_not_duplicated() {
        let mut user = student(0);
        user.badges.push("legacy".into());
        award(&mut user, 10, &default_badges());
        let earned = award(&mut user, 0, &default_badges());

        assert!(earned.is_empty());
        assert_eq!(user.badges, vec!["legacy".to_string(), "starter".to_string()]);
    }

    #[test]
    fn test_badge_set_matches_thresholds_after_award() {
        let badges = default_badges();
        let mut user = student(140);
        award(&mut user, 20, &badges);

        let expected: Vec<String> = badges
            .iter()
            .filter(|b| b.threshold <= user.points)
            .map(|b| b.id.clone())
            .collect();
        assert_eq!(user.badges, expected);
    }
}
