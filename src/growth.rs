// 生长阶段解析 - 根据记录历史推导植物的展示阶段
//
// 纯函数，不持有状态；输入为按插入顺序（最旧在前）排列的记录

use crate::models::{DisplayState, Entry, GrowthStage};

/// 根据记录序列解析当前生长阶段
///
/// 规则：
/// - 0 条记录 → Empty
/// - 1 条记录 → 按该条极性取 OneLeafPositive / OneLeafNegative
/// - 2 条记录 → 最近一条为正面取 TwoLeavesPositive，否则退回 OneLeafNegative
///   （与 1 条负面记录共用同一阶段，历史行为如此，勿"修复"）
/// - 3 条及以上 → ThreeLeaves，不再区分极性
pub fn resolve_stage(entries: &[Entry]) -> GrowthStage {
    match entries.len() {
        0 => GrowthStage::Empty,
        1 => {
            if entries[0].is_positive {
                GrowthStage::OneLeafPositive
            } else {
                GrowthStage::OneLeafNegative
            }
        }
        2 => {
            if entries[1].is_positive {
                GrowthStage::TwoLeavesPositive
            } else {
                GrowthStage::OneLeafNegative
            }
        }
        _ => GrowthStage::ThreeLeaves,
    }
}

/// 组合生长阶段与过渡动画标志，产出展示状态
pub fn display_state(entries: &[Entry], should_animate: bool) -> DisplayState {
    DisplayState {
        stage: resolve_stage(entries),
        should_animate_transition: should_animate,
    }
}
