//! 阶段判定 - 流程层
//!
//! 根据磁盘上的产物和缓存的元数据，决定一道题的两个阶段是否需要运行。
//! 纯函数，不接触会话。

use crate::models::Item;
use crate::services::{ArtifactInventory, LanguagePreferences};

/// 判定结果，附带原因（写进日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseDecision {
    Run(&'static str),
    Skip(&'static str),
}

impl PhaseDecision {
    pub fn should_run(self) -> bool {
        matches!(self, PhaseDecision::Run(_))
    }

    pub fn reason(self) -> &'static str {
        match self {
            PhaseDecision::Run(reason) | PhaseDecision::Skip(reason) => reason,
        }
    }
}

/// 题目是否完整：首选语言的题目文件存在，且有题目元数据
pub fn question_complete(
    item: &Item,
    inventory: &ArtifactInventory,
    languages: &LanguagePreferences,
) -> bool {
    let Some(meta) = item.question_meta.as_ref() else {
        return false;
    };
    let variant = languages.preferred_question(&meta.languages);
    inventory.has_question(variant.as_deref())
}

/// 题解是否完整：题解文件数不少于元数据记录的语言数，且两份评论区文件都在
///
/// 只抓一种语言时，有语言就至少需要一份题解文件。
/// 有代码块没读到、或者一份题解文件都没有时，一律视为不完整。
pub fn solution_complete(item: &Item, inventory: &ArtifactInventory, all_languages: bool) -> bool {
    let Some(meta) = item.solution_meta.as_ref() else {
        return false;
    };
    if meta.last_fetch.is_none() || meta.has_unread_frames() {
        return false;
    }
    if inventory.solution_count() == 0 {
        return false;
    }
    let required = if all_languages {
        meta.languages.len()
    } else {
        meta.languages.len().min(1)
    };
    inventory.solution_count() >= required && inventory.comments >= 2
}

pub fn question_needed(
    item: &Item,
    inventory: &ArtifactInventory,
    languages: &LanguagePreferences,
    force_refresh: bool,
) -> PhaseDecision {
    if item.question_meta.is_none() {
        return PhaseDecision::Run("没有题目元数据");
    }
    if force_refresh {
        return PhaseDecision::Run("强制刷新");
    }
    if !question_complete(item, inventory, languages) {
        return PhaseDecision::Run("题目文件缺失");
    }
    PhaseDecision::Skip("题目已完整")
}

/// 只有确认存在题解（或磁盘上已有题解文件）时才考虑题解阶段
pub fn solution_needed(
    item: &Item,
    inventory: &ArtifactInventory,
    all_languages: bool,
    force_refresh: bool,
) -> PhaseDecision {
    if !item.has_known_solution() && inventory.solution_count() == 0 {
        return PhaseDecision::Skip(if item.has_no_solution() {
            "没有题解"
        } else {
            "题解情况未知"
        });
    }
    if force_refresh {
        return PhaseDecision::Run("强制刷新");
    }
    if item.solution_meta.is_none() {
        return PhaseDecision::Run("没有题解元数据");
    }
    if item
        .solution_meta
        .as_ref()
        .is_some_and(|meta| meta.has_unread_frames())
    {
        return PhaseDecision::Run("上次有代码块未读取");
    }
    if !solution_complete(item, inventory, all_languages) {
        return PhaseDecision::Run("题解文件不全");
    }
    PhaseDecision::Skip("题解已完整")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionMeta, SolutionFrame, SolutionMeta, SolutionPresence};
    use chrono::Local;

    fn prefs() -> LanguagePreferences {
        LanguagePreferences::new(vec!["B".into(), "A".into()], vec!["B".into(), "A".into()])
    }

    fn item_with(presence: Option<SolutionPresence>, languages: &[&str]) -> Item {
        let mut item = Item::from_slug("two-sum");
        item.stat.frontend_question_id = 1;
        item.question_meta = presence.map(|has_solution| QuestionMeta {
            has_solution,
            languages: languages.iter().map(|s| s.to_string()).collect(),
            last_fetch: Some(Local::now()),
            ..Default::default()
        });
        item
    }

    fn inventory(question: &[&str], solution: &[&str], comments: usize) -> ArtifactInventory {
        ArtifactInventory {
            question: question.iter().map(|s| s.to_string()).collect(),
            solution: solution.iter().map(|s| s.to_string()).collect(),
            comments,
        }
    }

    fn solution_meta(languages: &[&str]) -> SolutionMeta {
        SolutionMeta {
            languages: languages.iter().map(|s| s.to_string()).collect(),
            last_fetch: Some(Local::now()),
            frames: Vec::new(),
        }
    }

    #[test]
    fn test_question_without_meta_runs() {
        let item = item_with(None, &[]);
        let decision = question_needed(&item, &inventory(&["A"], &[], 0), &prefs(), false);
        assert_eq!(decision, PhaseDecision::Run("没有题目元数据"));
    }

    #[test]
    fn test_question_checks_preferred_variant_file() {
        let item = item_with(Some(SolutionPresence::No), &["A"]);
        assert!(!question_needed(&item, &inventory(&["A"], &[], 0), &prefs(), false).should_run());
        assert!(question_needed(&item, &inventory(&["C"], &[], 0), &prefs(), false).should_run());
        assert!(question_needed(&item, &inventory(&["A"], &[], 0), &prefs(), true).should_run());
    }

    #[test]
    fn test_question_without_variants_uses_plain_file() {
        let item = item_with(Some(SolutionPresence::No), &[]);
        assert!(!question_needed(&item, &inventory(&[""], &[], 0), &prefs(), false).should_run());
    }

    #[test]
    fn test_no_solution_is_skipped_even_when_forced() {
        let item = item_with(Some(SolutionPresence::No), &["A"]);
        let decision = solution_needed(&item, &inventory(&["A"], &[], 0), true, true);
        assert_eq!(decision, PhaseDecision::Skip("没有题解"));
    }

    #[test]
    fn test_unknown_solution_with_files_is_checked() {
        let item = item_with(None, &[]);
        assert!(!solution_needed(&item, &inventory(&[], &[], 0), true, false).should_run());
        assert!(solution_needed(&item, &inventory(&[], &["A"], 2), true, false).should_run());
    }

    #[test]
    fn test_solution_completeness() {
        let mut item = item_with(Some(SolutionPresence::Yes), &["A"]);
        assert_eq!(
            solution_needed(&item, &inventory(&["A"], &[], 0), true, false),
            PhaseDecision::Run("没有题解元数据")
        );

        item.solution_meta = Some(solution_meta(&["A", "B"]));
        assert!(solution_needed(&item, &inventory(&[], &["A"], 2), true, false).should_run());
        assert!(solution_needed(&item, &inventory(&[], &["A", "B"], 1), true, false).should_run());
        assert!(!solution_needed(&item, &inventory(&[], &["A", "B"], 2), true, false).should_run());
        assert!(solution_needed(&item, &inventory(&[], &["A", "B"], 2), true, true).should_run());
    }

    #[test]
    fn test_single_language_mode_needs_one_file() {
        let mut item = item_with(Some(SolutionPresence::Yes), &["A"]);
        item.solution_meta = Some(solution_meta(&["A", "B"]));
        assert!(!solution_needed(&item, &inventory(&[], &["B"], 2), false, false).should_run());
        assert!(solution_needed(&item, &inventory(&[], &[], 2), false, false).should_run());
    }

    #[test]
    fn test_unread_frame_keeps_solution_incomplete() {
        let mut item = item_with(Some(SolutionPresence::Yes), &["A"]);
        let mut meta = solution_meta(&["A"]);
        meta.frames = vec![
            SolutionFrame::from_languages(vec!["A".to_string()]),
            SolutionFrame::unread(),
        ];
        item.solution_meta = Some(meta);

        let inv = inventory(&["A"], &["A"], 2);
        assert!(!solution_complete(&item, &inv, true));
        assert_eq!(
            solution_needed(&item, &inv, true, false),
            PhaseDecision::Run("上次有代码块未读取")
        );
    }

    #[test]
    fn test_no_solution_files_is_incomplete() {
        // 元数据里一种语言都没有时，也要至少有一份题解文件
        let mut item = item_with(Some(SolutionPresence::Yes), &["A"]);
        item.solution_meta = Some(solution_meta(&[]));
        assert!(!solution_complete(&item, &inventory(&[], &[], 2), true));
        assert!(solution_needed(&item, &inventory(&[], &[], 2), true, false).should_run());
        assert!(solution_complete(&item, &inventory(&[], &["A"], 2), true));
    }

    #[test]
    fn test_missing_last_fetch_is_incomplete() {
        let mut item = item_with(Some(SolutionPresence::Yes), &["A"]);
        let mut meta = solution_meta(&[]);
        meta.last_fetch = None;
        item.solution_meta = Some(meta);
        assert!(!solution_complete(&item, &inventory(&[], &[], 2), true));
    }
}
