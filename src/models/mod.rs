//! 领域数据模型
//! 用户、课程、测验、答题记录与徽章，整体作为一个 Dataset 聚合持久化

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::{new_id, new_prefixed_id};

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }

    /// 仪表盘标题
    pub fn label(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Faculty => "Faculty",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// 用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// 种子账号没有密码哈希，首次登录时设置
    #[serde(default)]
    pub pass_hash: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub badges: Vec<String>,
}

impl User {
    pub fn new(name: &str, email: &str, pass_hash: String, role: Role) -> Self {
        Self {
            id: new_prefixed_id("u"),
            name: name.to_string(),
            email: email.to_string(),
            pass_hash: Some(pass_hash),
            role,
            points: 0,
            badges: Vec::new(),
        }
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b == badge_id)
    }
}

/// 课程资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// 题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }
}

/// 测验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// 课程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub faculty_id: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

impl Course {
    pub fn quiz(&self, quiz_id: &str) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.id == quiz_id)
    }

    pub fn quiz_mut(&mut self, quiz_id: &str) -> Option<&mut Quiz> {
        self.quizzes.iter_mut().find(|q| q.id == quiz_id)
    }
}

/// 答题记录，创建后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub course_id: String,
    pub score: u32,
    pub total: u32,
    /// 每题所选选项下标，-1 表示未作答
    pub answers: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// 徽章定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: String,
    pub label: String,
    pub threshold: u32,
}

impl BadgeDefinition {
    fn new(id: &str, label: &str, threshold: u32) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            threshold,
        }
    }
}

/// 当前登录会话（全局单槽）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub email: String,
    pub name: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// 完整数据集
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    #[serde(default)]
    pub badges: Vec<BadgeDefinition>,
}

impl Dataset {
    /// 首次启动时写入的初始数据
    pub fn seed() -> Self {
        let seed_user = |id: &str, name: &str, email: &str, role: Role| User {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            pass_hash: None,
            role,
            points: 0,
            badges: Vec::new(),
        };

        let mut sam = seed_user("u-stu", "Student Sam", "sam@example.com", Role::Student);
        sam.points = 20;
        sam.badges.push("starter".to_string());

        let options = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            users: vec![
                seed_user("u-admin", "Admin", "admin@example.com", Role::Admin),
                seed_user("u-fac", "Prof. Ada", "ada@example.com", Role::Faculty),
                sam,
            ],
            courses: vec![Course {
                id: "c-js".to_string(),
                title: "Intro to JavaScript".to_string(),
                description: "Basics of JS, variables, functions, arrays.".to_string(),
                faculty_id: "u-fac".to_string(),
                materials: vec![Material {
                    id: new_id(),
                    title: "Lecture Slides - Week 1".to_string(),
                    url: "https://developer.mozilla.org/".to_string(),
                }],
                quizzes: vec![Quiz {
                    id: "q-js-1".to_string(),
                    title: "JS Basics Quiz".to_string(),
                    questions: vec![
                        Question {
                            id: new_id(),
                            text: "Which keyword declares a variable?".to_string(),
                            options: options(&["var", "let", "const", "all of the above"]),
                            correct_index: 3,
                        },
                        Question {
                            id: new_id(),
                            text: "Arrays in JS are:".to_string(),
                            options: options(&["Immutable", "Mutable", "Not supported", "Only numbers"]),
                            correct_index: 1,
                        },
                    ],
                }],
            }],
            attempts: Vec::new(),
            badges: default_badges(),
        }
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn user_mut(&mut self, user_id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }

    /// 邮箱比较不区分大小写
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    pub fn course_mut(&mut self, course_id: &str) -> Option<&mut Course> {
        self.courses.iter_mut().find(|c| c.id == course_id)
    }

    pub fn badge_label<'a>(&'a self, badge_id: &'a str) -> &'a str {
        self.badges
            .iter()
            .find(|b| b.id == badge_id)
            .map(|b| b.label.as_str())
            .unwrap_or(badge_id)
    }
}

/// 默认徽章阈值
pub fn default_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition::new("starter", "Starter", 10),
        BadgeDefinition::new("bronze", "Bronze Brain", 50),
        BadgeDefinition::new("silver", "Silver Scholar", 150),
        BadgeDefinition::new("gold", "Golden Guru", 300),
    ]
}
