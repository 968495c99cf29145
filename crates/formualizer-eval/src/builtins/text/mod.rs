//! The text function family, split across files the way the statistical
//! builtins are: shape-of-data-movement functions separate from the
//! searching and formatting ones.

mod find_search;
mod len_left_right;
mod mid_sub_replace;
mod trim_case_concat;
mod value_text;

use std::sync::Arc;

use crate::registry::FunctionRegistry;

pub fn register_builtins(reg: &mut FunctionRegistry) {
    reg.register(Arc::new(len_left_right::LenFn));
    reg.register(Arc::new(len_left_right::LeftFn));
    reg.register(Arc::new(len_left_right::RightFn));

    reg.register(Arc::new(mid_sub_replace::MidFn));
    reg.register(Arc::new(mid_sub_replace::SubstituteFn));
    reg.register(Arc::new(mid_sub_replace::ReplaceFn));

    reg.register(Arc::new(trim_case_concat::TrimFn));
    reg.register(Arc::new(trim_case_concat::LowerFn));
    reg.register(Arc::new(trim_case_concat::UpperFn));
    reg.register(Arc::new(trim_case_concat::ProperFn));
    reg.register(Arc::new(trim_case_concat::ExactFn));
    reg.register(Arc::new(trim_case_concat::ConcatFn));
    reg.register(Arc::new(trim_case_concat::TextJoinFn));
    reg.alias("CONCATENATE", "CONCAT");

    reg.register(Arc::new(find_search::FindFn));
    reg.register(Arc::new(find_search::SearchFn));

    reg.register(Arc::new(value_text::ValueFn));
    reg.register(Arc::new(value_text::TextFn));
}
