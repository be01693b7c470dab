// 情绪表 - 静态的情绪名称到极性查询表

use crate::models::Emotion;

/// 固定的情绪表
///
/// 顺序即展示顺序：正面情绪在前，负面情绪在后
const EMOTIONS: [Emotion; 8] = [
    Emotion {
        name: "Happy",
        emoji: "😊",
        is_positive: true,
    },
    Emotion {
        name: "Calm",
        emoji: "😌",
        is_positive: true,
    },
    Emotion {
        name: "Grateful",
        emoji: "🥰",
        is_positive: true,
    },
    Emotion {
        name: "Excited",
        emoji: "🤩",
        is_positive: true,
    },
    Emotion {
        name: "Sad",
        emoji: "😢",
        is_positive: false,
    },
    Emotion {
        name: "Angry",
        emoji: "😠",
        is_positive: false,
    },
    Emotion {
        name: "Anxious",
        emoji: "😰",
        is_positive: false,
    },
    Emotion {
        name: "Tired",
        emoji: "😮‍💨",
        is_positive: false,
    },
];

/// 按展示顺序返回全部情绪
pub fn list() -> &'static [Emotion] {
    &EMOTIONS
}

/// 按名称查找情绪，找不到返回 None
pub fn lookup(name: &str) -> Option<Emotion> {
    EMOTIONS.iter().find(|e| e.name == name).copied()
}
