//! Conditional-format rule resolution.
//!
//! Rules are ordered, matched against cell values, and the matching rule's
//! differential fill is stamped onto the grid.
//!
//! # Ordering
//!
//! Rules inside a block are sorted by `priority` descending, then blocks
//! are sorted by their first rule's priority, descending. Under
//! [`ConflictPolicy::LastApplied`] every match overwrites, so the rule
//! visited last (the one with the smallest priority number) decides a cell
//! that several rules match. That agrees with Excel, where priority 1 sits
//! on top.

use crate::color::Color;
use crate::model::Grid;
use crate::range::{parse_sqref_list, RangeGrammar, SqrefRange};
use crate::xlsx::DxfTable;
use serde::{Deserialize, Serialize};

/// The predicate a rule evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfKind {
    /// Trimmed value is non-empty
    NotContainsBlanks,
    /// Value contains the rule's text, case-sensitively
    ContainsText,
    /// Any other `type`; never matches
    Other(String),
}

impl CfKind {
    /// Map a `cfRule` `type` attribute to a kind.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "notContainsBlanks" => CfKind::NotContainsBlanks,
            "containsText" => CfKind::ContainsText,
            other => CfKind::Other(other.to_string()),
        }
    }
}

/// A single `<cfRule>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfRule {
    pub kind: CfKind,
    /// Index into the differential-format table; absent when the rule has none
    pub dxf_id: Option<u32>,
    pub priority: i64,
    pub text: Option<String>,
}

impl CfRule {
    pub fn new(kind: CfKind, dxf_id: Option<u32>, priority: i64) -> Self {
        Self {
            kind,
            dxf_id,
            priority,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Evaluate the rule's predicate against a cell value.
    pub fn matches(&self, value: &str) -> bool {
        match &self.kind {
            CfKind::NotContainsBlanks => !value.trim().is_empty(),
            CfKind::ContainsText => match self.text.as_deref() {
                Some(text) if !text.is_empty() => value.contains(text),
                _ => false,
            },
            CfKind::Other(_) => false,
        }
    }
}

/// A `<conditionalFormatting>` block: one `sqref` and its rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalFormatting {
    /// Space-separated range tokens
    pub sqref: String,
    pub rules: Vec<CfRule>,
}

impl ConditionalFormatting {
    pub fn new(sqref: impl Into<String>, rules: Vec<CfRule>) -> Self {
        Self {
            sqref: sqref.into(),
            rules,
        }
    }
}

/// What happens when a second rule matches a cell that already got a color
/// during the same application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Every match overwrites; the last rule visited wins.
    #[default]
    LastApplied,
    /// The first rule visited keeps the cell; later matches are ignored.
    FirstApplied,
}

/// Applies conditional formatting blocks to a grid.
#[derive(Debug, Clone, Copy)]
pub struct CfEngine<'a> {
    dxfs: &'a DxfTable,
    grammar: RangeGrammar,
    policy: ConflictPolicy,
}

impl<'a> CfEngine<'a> {
    pub fn new(dxfs: &'a DxfTable) -> Self {
        Self {
            dxfs,
            grammar: RangeGrammar::default(),
            policy: ConflictPolicy::default(),
        }
    }

    pub fn with_grammar(mut self, grammar: RangeGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Blocks and their rules in application order. Blocks without rules
    /// are dropped.
    pub fn order(blocks: &[ConditionalFormatting]) -> Vec<ConditionalFormatting> {
        let mut ordered: Vec<ConditionalFormatting> = blocks
            .iter()
            .filter(|block| !block.rules.is_empty())
            .cloned()
            .collect();
        for block in &mut ordered {
            block.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        ordered.sort_by(|a, b| b.rules[0].priority.cmp(&a.rules[0].priority));
        ordered
    }

    /// Resolve every block over `grid`, returning the number of color writes.
    ///
    /// Ranges are clamped to the grid's row count and longest row, then
    /// clipped again to each row's own length. A rule whose `dxfId` does
    /// not resolve to a fill leaves cells untouched.
    pub fn apply(&self, grid: &mut Grid, blocks: &[ConditionalFormatting]) -> usize {
        let total_rows = grid.row_count();
        let total_cols = grid.col_count();
        if total_rows == 0 || total_cols == 0 {
            return 0;
        }

        let mut claimed = match self.policy {
            ConflictPolicy::FirstApplied => Some(vec![vec![false; total_cols]; total_rows]),
            ConflictPolicy::LastApplied => None,
        };
        let mut writes = 0;

        for block in Self::order(blocks) {
            let ranges = parse_sqref_list(&block.sqref, total_rows, total_cols, self.grammar);
            for rule in &block.rules {
                let Some(color) = self.dxfs.fill_color(rule.dxf_id) else {
                    log::debug!(
                        "rule {:?} (priority {}) has no fill for dxfId {:?}",
                        rule.kind,
                        rule.priority,
                        rule.dxf_id
                    );
                    continue;
                };
                for range in &ranges {
                    writes += self.paint(grid, range, rule, color, claimed.as_mut());
                }
            }
        }

        writes
    }

    fn paint(
        &self,
        grid: &mut Grid,
        range: &SqrefRange,
        rule: &CfRule,
        color: Color,
        mut claimed: Option<&mut Vec<Vec<bool>>>,
    ) -> usize {
        let mut writes = 0;
        let last_row = range.end_row.min(grid.row_count().saturating_sub(1));
        for r in range.start_row..=last_row {
            let row = &mut grid.rows[r];
            if row.is_empty() || range.start_col >= row.len() {
                continue;
            }
            let last_col = range.end_col.min(row.len() - 1);
            for c in range.start_col..=last_col {
                let Some(cell) = row[c].as_mut() else {
                    continue;
                };
                if !rule.matches(&cell.value) {
                    continue;
                }
                if let Some(claimed) = claimed.as_deref_mut() {
                    if claimed[r][c] {
                        continue;
                    }
                    claimed[r][c] = true;
                }
                cell.color = color;
                writes += 1;
            }
        }
        writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;
    use crate::xlsx::DxfEntry;

    fn dxfs() -> DxfTable {
        DxfTable::from_entries(vec![
            DxfEntry {
                fill: Some(Color::Red),
            },
            DxfEntry {
                fill: Some(Color::Green),
            },
            DxfEntry { fill: None },
        ])
    }

    fn grid(values: &[&[&str]]) -> Grid {
        Grid::from_rows(
            values
                .iter()
                .map(|row| row.iter().map(|v| Some(Cell::new(*v))).collect())
                .collect(),
        )
    }

    fn colors(grid: &Grid) -> Vec<Vec<Color>> {
        grid.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|slot| slot.as_ref().map(|c| c.color).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_predicates() {
        let blanks = CfRule::new(CfKind::NotContainsBlanks, Some(0), 1);
        assert!(blanks.matches("x"));
        assert!(!blanks.matches("   "));

        let text = CfRule::new(CfKind::ContainsText, Some(0), 1).with_text("ab");
        assert!(text.matches("xaby"));
        assert!(!text.matches("xAby"));
        assert!(!CfRule::new(CfKind::ContainsText, Some(0), 1).matches("anything"));

        let other = CfRule::new(CfKind::from_type_name("cellIs"), Some(0), 1);
        assert_eq!(other.kind, CfKind::Other("cellIs".to_string()));
        assert!(!other.matches("x"));
    }

    #[test]
    fn test_not_contains_blanks_on_blank_grid() {
        let mut g = grid(&[&["", " ", ""], &["", "", ""], &["\t", "", ""]]);
        let blocks = vec![ConditionalFormatting::new(
            "A1:C3",
            vec![CfRule::new(CfKind::NotContainsBlanks, Some(1), 1)],
        )];
        let table = dxfs();
        assert_eq!(CfEngine::new(&table).apply(&mut g, &blocks), 0);
        assert!(colors(&g).iter().flatten().all(|c| *c == Color::None));

        g.get_mut(1, 2).unwrap().value = "hit".to_string();
        assert_eq!(CfEngine::new(&table).apply(&mut g, &blocks), 1);
        assert_eq!(g.get(1, 2).unwrap().color, Color::Green);
        assert_eq!(colors(&g).iter().flatten().filter(|c| !c.is_none()).count(), 1);
    }

    #[test]
    fn test_dxf_miss_leaves_color() {
        let mut g = grid(&[&["a"]]);
        g.get_mut(0, 0).unwrap().color = Color::LightYellow;
        let blocks = vec![ConditionalFormatting::new(
            "A1:A1",
            vec![
                CfRule::new(CfKind::NotContainsBlanks, Some(2), 3),
                CfRule::new(CfKind::NotContainsBlanks, Some(42), 2),
                CfRule::new(CfKind::NotContainsBlanks, None, 1),
            ],
        )];
        let table = dxfs();
        assert_eq!(CfEngine::new(&table).apply(&mut g, &blocks), 0);
        assert_eq!(g.get(0, 0).unwrap().color, Color::LightYellow);
    }

    #[test]
    fn test_order_sorts_rules_then_blocks() {
        let blocks = vec![
            ConditionalFormatting::new(
                "A1:A1",
                vec![
                    CfRule::new(CfKind::NotContainsBlanks, Some(0), 1),
                    CfRule::new(CfKind::NotContainsBlanks, Some(0), 5),
                ],
            ),
            ConditionalFormatting::new("B1:B1", vec![]),
            ConditionalFormatting::new(
                "C1:C1",
                vec![CfRule::new(CfKind::NotContainsBlanks, Some(0), 9)],
            ),
        ];
        let ordered = CfEngine::order(&blocks);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].sqref, "C1:C1");
        assert_eq!(ordered[1].sqref, "A1:A1");
        let priorities: Vec<i64> = ordered[1].rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![5, 1]);
    }

    #[test]
    fn test_last_applied_lowest_priority_number_wins() {
        let blocks = vec![
            ConditionalFormatting::new(
                "A1:B1",
                vec![CfRule::new(CfKind::NotContainsBlanks, Some(1), 1)],
            ),
            ConditionalFormatting::new(
                "A1:A1",
                vec![CfRule::new(CfKind::ContainsText, Some(0), 2).with_text("x")],
            ),
        ];
        let table = dxfs();

        let mut g = grid(&[&["x", "y"]]);
        CfEngine::new(&table).apply(&mut g, &blocks);
        // Priority 2 runs first, priority 1 overwrites it.
        assert_eq!(colors(&g), vec![vec![Color::Green, Color::Green]]);

        let mut g = grid(&[&["x", "y"]]);
        CfEngine::new(&table)
            .with_policy(ConflictPolicy::FirstApplied)
            .apply(&mut g, &blocks);
        assert_eq!(colors(&g), vec![vec![Color::Red, Color::Green]]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let blocks = vec![
            ConditionalFormatting::new(
                "A1:C2",
                vec![CfRule::new(CfKind::ContainsText, Some(0), 2).with_text("a")],
            ),
            ConditionalFormatting::new(
                "B:B",
                vec![CfRule::new(CfKind::NotContainsBlanks, Some(1), 1)],
            ),
        ];
        let table = dxfs();
        for policy in [ConflictPolicy::LastApplied, ConflictPolicy::FirstApplied] {
            let engine = CfEngine::new(&table).with_policy(policy);
            let mut g = grid(&[&["a", "ab", ""], &["b", "", "a"]]);
            engine.apply(&mut g, &blocks);
            let once = colors(&g);
            engine.apply(&mut g, &blocks);
            assert_eq!(colors(&g), once);
        }
    }

    #[test]
    fn test_ranges_clip_to_jagged_rows() {
        let mut g = Grid::from_rows(vec![
            vec![Some(Cell::new("a"))],
            vec![None, Some(Cell::new("b")), Some(Cell::new("c"))],
            vec![],
        ]);
        let blocks = vec![ConditionalFormatting::new(
            "A1:$ET$68 bogus",
            vec![CfRule::new(CfKind::NotContainsBlanks, Some(0), 1)],
        )];
        let table = dxfs();
        assert_eq!(CfEngine::new(&table).apply(&mut g, &blocks), 3);
        assert_eq!(g.get(0, 0).unwrap().color, Color::Red);
        assert_eq!(g.get(1, 1).unwrap().color, Color::Red);
        assert_eq!(g.get(1, 2).unwrap().color, Color::Red);
    }

    #[test]
    fn test_empty_grid_is_untouched() {
        let mut g = Grid::new();
        let blocks = vec![ConditionalFormatting::new(
            "A1:B2",
            vec![CfRule::new(CfKind::NotContainsBlanks, Some(0), 1)],
        )];
        let table = dxfs();
        assert_eq!(CfEngine::new(&table).apply(&mut g, &blocks), 0);
        assert!(g.is_empty());
    }
}
