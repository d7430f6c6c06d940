//! Collapse/expand layout for long forms.
//!
//! Walks the visible schema entries in order, summing each entry's column
//! span for the current viewport width. Entries within the "always show"
//! rows stay visible while collapsed; the rest follow the toggle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::form::component::BASIC_COL_LEN;
use crate::form::methods::{FormEvent, SchemaForm};
use crate::form::schema::ColProps;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
    Xxl,
}

impl Screen {
    pub fn key(self) -> &'static str {
        match self {
            Screen::Xs => "xs",
            Screen::Sm => "sm",
            Screen::Md => "md",
            Screen::Lg => "lg",
            Screen::Xl => "xl",
            Screen::Xxl => "xxl",
        }
    }
}

/// Width thresholds in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    pub xs: u32,
    pub sm: u32,
    pub md: u32,
    pub lg: u32,
    pub xl: u32,
    pub xxl: u32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Breakpoints {
            xs: 480,
            sm: 576,
            md: 768,
            lg: 992,
            xl: 1200,
            xxl: 1600,
        }
    }
}

impl Breakpoints {
    pub fn screen_for(&self, width: u32) -> Screen {
        if width < self.xs {
            Screen::Xs
        } else if width < self.sm {
            Screen::Sm
        } else if width < self.md {
            Screen::Md
        } else if width < self.lg {
            Screen::Lg
        } else if width < self.xl {
            Screen::Xl
        } else {
            Screen::Xxl
        }
    }

    /// Span an entry occupies at `width`, falling back md → lg → xl → xxl.
    pub fn column_width(&self, col: &ColProps, width: u32) -> u32 {
        let positive = |v: Option<u32>| v.filter(|n| *n > 0);

        let md = positive(col.md)
            .or(positive(col.xs))
            .or(positive(col.sm))
            .or(positive(col.span))
            .unwrap_or(BASIC_COL_LEN);
        let lg = positive(col.lg).unwrap_or(md);
        let xl = positive(col.xl).unwrap_or(lg);
        let xxl = positive(col.xxl).unwrap_or(xl);

        if width <= self.lg {
            md
        } else if width < self.xl {
            lg
        } else if width < self.xxl {
            xl
        } else {
            xxl
        }
    }
}

/// Extra blank columns appended to the action row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmptySpan {
    Fixed(u32),
    /// Keys are screen names (`xs`..`xxl`) plus an optional `span` fallback.
    PerScreen(BTreeMap<String, u32>),
}

impl Default for EmptySpan {
    fn default() -> Self {
        EmptySpan::Fixed(0)
    }
}

impl EmptySpan {
    pub fn for_screen(&self, screen: Screen) -> u32 {
        match self {
            EmptySpan::Fixed(n) => *n,
            EmptySpan::PerScreen(map) => map
                .get(screen.key())
                .copied()
                .filter(|n| *n > 0)
                .or_else(|| map.get("span").copied())
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceState {
    /// Expanded when true.
    pub is_advanced: bool,
    pub hide_advance_btn: bool,
    /// Latched after the first automatic collapse.
    pub is_load: bool,
    pub action_span: u32,
}

impl Default for AdvanceState {
    fn default() -> Self {
        AdvanceState {
            is_advanced: true,
            hide_advance_btn: false,
            is_load: false,
            action_span: 6,
        }
    }
}

struct LayoutPolicy {
    width: u32,
    breakpoints: Breakpoints,
    always_show_lines: u32,
    auto_advanced_line: u32,
}

impl LayoutPolicy {
    /// Add `col` to the running sum. Returns whether the entry is shown while
    /// collapsed, and the new sum. The last call (the action row) settles
    /// the toggle state.
    fn step(&self, state: &mut AdvanceState, col: &ColProps, sum: u32, is_last_action: bool) -> (bool, u32) {
        let sum = sum + self.breakpoints.column_width(col, self.width);

        if is_last_action {
            state.hide_advance_btn = false;
            if sum <= BASIC_COL_LEN * 2 {
                state.hide_advance_btn = true;
                state.is_advanced = true;
            } else if sum <= BASIC_COL_LEN * self.auto_advanced_line.max(1) {
                state.hide_advance_btn = false;
            } else if !state.is_load {
                state.is_load = true;
                state.is_advanced = !state.is_advanced;
            }
            return (state.is_advanced, sum);
        }

        if sum > BASIC_COL_LEN * self.always_show_lines.max(1) {
            (state.is_advanced, sum)
        } else {
            // The first rows are always shown.
            (true, sum)
        }
    }
}

impl SchemaForm {
    /// Recompute which entries are shown while collapsed.
    ///
    /// Runs on schema changes, toggles and width changes when the advanced
    /// button is enabled. A pass that flips the expansion state triggers one
    /// more pass so entries reflect the settled state.
    pub(crate) fn update_advanced(&mut self) {
        if !self.state.props.show_advanced_button {
            return;
        }
        let before = self.state.advance_state.is_advanced;
        self.advanced_pass();
        if self.state.advance_state.is_advanced != before {
            self.advanced_pass();
        }
    }

    fn advanced_pass(&mut self) {
        let policy = LayoutPolicy {
            width: self.viewport_width,
            breakpoints: self.breakpoints,
            always_show_lines: self.state.props.always_show_lines,
            auto_advanced_line: self.state.props.auto_advanced_line,
        };
        let base_col = self.state.props.base_col_props.clone();

        let visibility: Vec<bool> = self
            .state
            .props
            .schemas
            .iter()
            .map(|schema| {
                self.state
                    .with_context(schema, |ctx| schema.v_show.is_shown(ctx))
            })
            .collect();

        let mut item_col_sum = 0;
        let mut real_item_col_sum = 0;
        let mut advance = self.state.advance_state.clone();

        for (schema, shown) in self.state.props.schemas.iter_mut().zip(visibility) {
            if !shown {
                continue;
            }
            let col = match &schema.col_props {
                Some(col) => base_col.overlay(col),
                None => base_col.clone(),
            };
            let (is_advanced, sum) = policy.step(&mut advance, &col, item_col_sum, false);
            item_col_sum = sum;
            if is_advanced {
                real_item_col_sum = item_col_sum;
            }
            schema.is_advanced = is_advanced;
        }

        let empty_span = if advance.is_advanced {
            let screen = policy.breakpoints.screen_for(policy.width);
            self.state.props.empty_span.for_screen(screen)
        } else {
            0
        };
        advance.action_span = (real_item_col_sum % BASIC_COL_LEN) + empty_span;

        let action_col = self
            .state
            .props
            .action_col_options
            .clone()
            .unwrap_or_else(|| ColProps::span(BASIC_COL_LEN));
        policy.step(&mut advance, &action_col, item_col_sum, true);

        self.state.advance_state = advance;
        self.events.push(FormEvent::AdvancedChange);
    }

    /// Flip between collapsed and expanded.
    pub fn handle_toggle_advanced(&mut self) {
        self.state.advance_state.is_advanced = !self.state.advance_state.is_advanced;
        self.update_advanced();
    }

    pub fn set_viewport_width(&mut self, width: u32) {
        if self.viewport_width != width {
            self.viewport_width = width;
            self.update_advanced();
        }
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    pub fn set_breakpoints(&mut self, breakpoints: Breakpoints) {
        self.breakpoints = breakpoints;
        self.update_advanced();
    }

    pub fn advance_state(&self) -> &AdvanceState {
        &self.state.advance_state
    }

    /// Whether the rendering layer should show `field` right now: its
    /// visibility predicate holds and, when collapsing is enabled, it is
    /// either in the always-shown rows or the form is expanded.
    pub fn is_field_visible(&self, field: &str) -> bool {
        let Some(schema) = self.state.props.schemas.iter().find(|s| s.field == field) else {
            return false;
        };
        let shown = self.state.with_context(schema, |ctx| schema.v_show.is_shown(ctx));
        if !shown {
            return false;
        }
        !self.state.props.show_advanced_button || schema.is_advanced
    }
}
