pub mod company;
pub mod selector_rule;
