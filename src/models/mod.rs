// 数据模型模块 - 定义所有的数据结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 情绪记录条目
///
/// 创建后不可变；`is_positive` 在创建时从情绪表冗余写入，
/// 即使之后情绪表发生变化，历史记录的极性也保持稳定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// 唯一标识（UUID 文本形式）
    pub id: String,
    /// 记录时间
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    /// 情绪名称
    #[serde(rename = "emotion")]
    pub emotion_name: String,
    /// 备注（可为空字符串）
    pub note: String,
    /// 情绪极性
    #[serde(rename = "isPositive")]
    pub is_positive: bool,
}

impl Entry {
    /// 以当前时间和新生成的 ID 构造一条记录
    pub fn new(emotion_name: String, note: String, is_positive: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            emotion_name,
            note,
            is_positive,
        }
    }
}

/// 情绪表条目
///
/// 静态只读，进程启动时固定，不支持修改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Emotion {
    /// 情绪名称
    pub name: &'static str,
    /// 显示符号
    pub emoji: &'static str,
    /// 是否正面情绪
    pub is_positive: bool,
}

/// 疏导活动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Breathing,  // 呼吸练习
    Exercising, // 运动
    Journaling, // 日记
}

/// 呼吸练习的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreathingPhase {
    BreatheIn,
    BreatheOut,
}

impl BreathingPhase {
    /// 切换到相反的阶段
    pub fn flipped(&self) -> Self {
        match self {
            Self::BreatheIn => Self::BreatheOut,
            Self::BreatheOut => Self::BreatheIn,
        }
    }
}

/// 植物生长阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrowthStage {
    /// 没有任何记录
    Empty,
    /// 一条记录且为正面
    OneLeafPositive,
    /// 最近一条为负面（一条或两条记录时共用）
    OneLeafNegative,
    /// 两条记录且最近一条为正面
    TwoLeavesPositive,
    /// 三条及以上记录
    ThreeLeaves,
}

/// 会话状态（单一标签状态机）
///
/// 同一时刻只可能处于一个状态，互斥由类型结构保证
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    /// 空闲，未在记录
    Idle,
    /// 正在填写情绪和备注
    LoggingEmotion,
    /// 等待用户选择疏导活动
    PromptingCopingChoice,
    /// 呼吸练习进行中
    RunningBreathing {
        /// 当前呼吸阶段
        phase: BreathingPhase,
        /// 已完成的阶段切换次数
        flips: u32,
    },
    /// 计时活动进行中
    RunningTimedActivity {
        /// 活动类型（运动或日记）
        kind: ActivityKind,
        /// 剩余秒数
        remaining_secs: u32,
    },
    /// 本轮记录完成，保留到下一次开始记录
    Completed {
        /// 完成时对应的生长阶段
        stage: GrowthStage,
        /// 是否需要播放过渡动画（一次性标志）
        should_animate: bool,
    },
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// 展示状态（派生值，不持久化）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayState {
    /// 生长阶段
    pub stage: GrowthStage,
    /// 是否播放过渡动画
    pub should_animate_transition: bool,
}

/// 活动计时设置
///
/// 间隔均以毫秒表示，便于调试时加速；默认值即产品节奏
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySettings {
    /// 负面情绪提交后进入活动选择的延迟（毫秒）
    pub prompt_delay_ms: u64,
    /// 呼吸阶段切换间隔（毫秒），正常为4秒
    pub breathing_phase_ms: u64,
    /// 完成呼吸练习所需的阶段切换次数
    pub breathing_flips: u32,
    /// 最后一次切换后的收尾延迟（毫秒）
    pub completion_delay_ms: u64,
    /// 计时活动倒计时总步数（每步减1，名义上1步=1秒）
    pub countdown_secs: u32,
    /// 倒计时步进间隔（毫秒），正常为1000
    pub countdown_tick_ms: u64,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            prompt_delay_ms: 400,
            breathing_phase_ms: 4000,
            breathing_flips: 10,
            completion_delay_ms: 1000,
            countdown_secs: 900,
            countdown_tick_ms: 1000,
        }
    }
}

/// 应用配置（部分更新用，字段为空表示保持不变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodConfig {
    /// 活动计时设置
    pub activity_settings: Option<ActivitySettings>,
}

/// 持久化的应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedMoodConfig {
    /// 活动计时设置
    pub activity_settings: ActivitySettings,
}

impl Default for PersistedMoodConfig {
    fn default() -> Self {
        Self {
            activity_settings: ActivitySettings::default(),
        }
    }
}
