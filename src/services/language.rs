//! 语言偏好 - 业务能力层
//!
//! 纯函数：给定一道题可用的语言，选出要渲染的那一个。

use phf::phf_map;
use tracing::warn;

/// 同一门语言的两种写法，任一方向都可以互相替代
static EQUIVALENTS: phf::Map<&'static str, &'static str> = phf_map! {
    "Python" => "Python3",
    "Python3" => "Python",
    "Java" => "C#",
    "C#" => "Java",
    "C++" => "C",
    "C" => "C++",
};

/// 调用方违约（空集合）时在 release 下使用的语言
const FALLBACK_LANGUAGE: &str = "Java";

/// 题目和题解各自的语言偏好列表
#[derive(Debug, Clone)]
pub struct LanguagePreferences {
    question: Vec<String>,
    solution: Vec<String>,
}

impl LanguagePreferences {
    pub fn new(question: Vec<String>, solution: Vec<String>) -> Self {
        Self { question, solution }
    }

    /// 题目页使用的语言
    pub fn preferred_question(&self, available: &[String]) -> Option<String> {
        resolve_preferred(&self.question, available)
    }

    /// 只抓一种语言时，题解使用的语言
    pub fn preferred_solution(&self, available: &[String]) -> Option<String> {
        resolve_preferred(&self.solution, available)
    }

    /// 某个代码块没有 `wanted` 时，找一个最接近的替代
    ///
    /// 结果一定在 `available` 里。`available` 不能为空。
    pub fn resolve_closest(&self, wanted: &str, available: &[String]) -> String {
        if available.is_empty() {
            debug_assert!(false, "resolve_closest 需要非空的可选语言");
            warn!("可选语言为空，退回 {}", FALLBACK_LANGUAGE);
            return FALLBACK_LANGUAGE.to_string();
        }

        if available.iter().any(|lang| lang == wanted) {
            return wanted.to_string();
        }
        if let Some(equivalent) = EQUIVALENTS.get(wanted) {
            if available.iter().any(|lang| lang == equivalent) {
                return (*equivalent).to_string();
            }
        }

        // available 非空，这里一定有结果
        resolve_preferred(&self.solution, available).unwrap_or_else(|| FALLBACK_LANGUAGE.to_string())
    }
}

/// 按偏好列表顺序取第一个可用的；都不可用时取字典序最小的
///
/// 字典序回退保证结果与 `available` 的顺序无关。
pub fn resolve_preferred(preferences: &[String], available: &[String]) -> Option<String> {
    preferences
        .iter()
        .find(|pref| available.contains(pref))
        .or_else(|| available.iter().min())
        .cloned()
}
