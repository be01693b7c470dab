// Activity Session Actor - 使用Actor模式管理记录会话状态机
//
// 用消息传递替代Arc<Mutex<SessionState>>，所有状态变更在单一任务内串行执行
// 计时器以独立任务发送带纪元标记的tick命令，过期tick被忽略，避免旧回调污染新状态

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, sleep, Duration};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::event_bus::{AppEvent, EventBus};
use crate::growth;
use crate::models::{
    ActivityKind, ActivitySettings, BreathingPhase, Entry, GrowthStage, SessionState,
};
use crate::storage::EntryStore;

/// 会话命令（仅经由Handle发送，计时器tick变体为Actor内部专用）
pub(crate) enum SessionCommand {
    /// 开始记录（Idle或Completed时有效）
    StartLogging {
        reply: oneshot::Sender<SessionState>,
    },

    /// 取消记录（LoggingEmotion时有效）
    Cancel {
        reply: oneshot::Sender<SessionState>,
    },

    /// 提交情绪和备注（LoggingEmotion时有效）
    ///
    /// 情绪名称不在情绪表中时拒绝提交，状态不变
    Submit {
        emotion_name: String,
        note: String,
        reply: oneshot::Sender<Result<SessionState, String>>,
    },

    /// 选择疏导活动（PromptingCopingChoice时有效）
    Choose {
        kind: ActivityKind,
        reply: oneshot::Sender<SessionState>,
    },

    /// 跳过当前活动（RunningBreathing或RunningTimedActivity时有效）
    Skip {
        reply: oneshot::Sender<SessionState>,
    },

    /// 获取当前状态
    Get {
        reply: oneshot::Sender<SessionState>,
    },

    /// 取走一次性的过渡动画提示（取走后标志清零）
    TakeAnimationHint {
        reply: oneshot::Sender<Option<GrowthStage>>,
    },

    /// 健康检查
    HealthCheck { reply: oneshot::Sender<()> },

    // --- 以下为计时器任务内部发送的命令，不对外暴露 ---
    /// 负面提交后的延迟到期，进入活动选择
    PromptDelayElapsed { epoch: u64 },

    /// 呼吸阶段切换tick；回复false表示tick已过期，发送任务应停止
    BreathingTick {
        epoch: u64,
        reply: oneshot::Sender<bool>,
    },

    /// 倒计时tick；回复false表示tick已过期，发送任务应停止
    CountdownTick {
        epoch: u64,
        reply: oneshot::Sender<bool>,
    },

    /// 呼吸练习收尾延迟到期，进入完成态
    CompletionDelayElapsed { epoch: u64 },
}

/// 记录会话Actor
///
/// 状态机：Idle → LoggingEmotion → (正面回Idle / 负面进PromptingCopingChoice)
/// → RunningBreathing / RunningTimedActivity → Completed → (下次开始记录回LoggingEmotion)
pub struct ActivitySessionActor {
    receiver: mpsc::Receiver<SessionCommand>,
    /// 计时器任务向Actor回发tick用
    self_sender: mpsc::Sender<SessionCommand>,
    state: SessionState, // 无需Mutex
    /// 计时器纪元：每次状态跃迁递增，旧纪元的tick一律忽略
    timer_epoch: u64,
    /// 负面提交后、进入活动选择前的延迟窗口标记；窗口内重复提交一律忽略
    prompt_pending: bool,
    store: Arc<EntryStore>,
    event_bus: Arc<EventBus>,
    settings: ActivitySettings,
}

impl ActivitySessionActor {
    /// 创建新的Actor
    pub fn new(
        store: Arc<EntryStore>,
        event_bus: Arc<EventBus>,
        settings: ActivitySettings,
    ) -> (Self, ActivitySessionHandle) {
        let (sender, receiver) = mpsc::channel(50);
        let actor = Self {
            receiver,
            self_sender: sender.clone(),
            state: SessionState::Idle,
            timer_epoch: 0,
            prompt_pending: false,
            store,
            event_bus,
            settings,
        };
        let handle = ActivitySessionHandle { sender };
        (actor, handle)
    }

    /// 运行Actor
    pub async fn run(mut self) {
        info!("Activity Session Actor 已启动");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::StartLogging { reply } => {
                    match self.state {
                        SessionState::Idle | SessionState::Completed { .. } => {
                            self.enter_state(SessionState::LoggingEmotion);
                        }
                        // 记录或活动进行中，忽略
                        _ => debug!("忽略开始记录请求，当前状态: {:?}", self.state),
                    }
                    let _ = reply.send(self.state.clone());
                }

                SessionCommand::Cancel { reply } => {
                    if self.state == SessionState::LoggingEmotion {
                        self.enter_state(SessionState::Idle);
                    } else {
                        debug!("忽略取消请求，当前状态: {:?}", self.state);
                    }
                    let _ = reply.send(self.state.clone());
                }

                SessionCommand::Submit {
                    emotion_name,
                    note,
                    reply,
                } => {
                    let result = self.handle_submit(emotion_name, note).await;
                    let _ = reply.send(result);
                }

                SessionCommand::Choose { kind, reply } => {
                    if self.state == SessionState::PromptingCopingChoice {
                        self.start_activity(kind);
                    } else {
                        debug!("忽略活动选择，当前状态: {:?}", self.state);
                    }
                    let _ = reply.send(self.state.clone());
                }

                SessionCommand::Skip { reply } => {
                    match self.state {
                        SessionState::RunningBreathing { .. } => {
                            self.complete(ActivityKind::Breathing).await;
                        }
                        SessionState::RunningTimedActivity { kind, .. } => {
                            self.complete(kind).await;
                        }
                        // 没有进行中的活动，忽略
                        _ => debug!("忽略跳过请求，当前状态: {:?}", self.state),
                    }
                    let _ = reply.send(self.state.clone());
                }

                SessionCommand::Get { reply } => {
                    let _ = reply.send(self.state.clone());
                }

                SessionCommand::TakeAnimationHint { reply } => {
                    let hint = match &mut self.state {
                        SessionState::Completed {
                            stage,
                            should_animate,
                        } if *should_animate => {
                            *should_animate = false;
                            Some(*stage)
                        }
                        _ => None,
                    };
                    let _ = reply.send(hint);
                }

                SessionCommand::HealthCheck { reply } => {
                    let _ = reply.send(());
                }

                SessionCommand::PromptDelayElapsed { epoch } => {
                    if epoch == self.timer_epoch && self.state == SessionState::LoggingEmotion {
                        self.enter_state(SessionState::PromptingCopingChoice);
                    }
                }

                SessionCommand::BreathingTick { epoch, reply } => {
                    let keep_going = self.handle_breathing_tick(epoch);
                    let _ = reply.send(keep_going);
                }

                SessionCommand::CountdownTick { epoch, reply } => {
                    let keep_going = self.handle_countdown_tick(epoch).await;
                    let _ = reply.send(keep_going);
                }

                SessionCommand::CompletionDelayElapsed { epoch } => {
                    if epoch == self.timer_epoch {
                        if let SessionState::RunningBreathing { .. } = self.state {
                            self.complete(ActivityKind::Breathing).await;
                        }
                    }
                }
            }
        }

        info!("Activity Session Actor 已停止");
    }

    /// 处理提交：查表校验 → 写入存储 → 按极性分流
    async fn handle_submit(
        &mut self,
        emotion_name: String,
        note: String,
    ) -> Result<SessionState, String> {
        if self.state != SessionState::LoggingEmotion {
            debug!("忽略提交请求，当前状态: {:?}", self.state);
            return Ok(self.state.clone());
        }
        // 一轮记录只产生一条记录：延迟窗口内的重复提交忽略
        if self.prompt_pending {
            debug!("忽略提交请求，活动选择延迟进行中");
            return Ok(self.state.clone());
        }

        // 情绪表中查不到的名称拒绝提交，不产生记录，状态不变
        let emotion = catalog::lookup(&emotion_name)
            .ok_or_else(|| format!("未知的情绪名称: {}", emotion_name))?;

        let entry = Entry::new(emotion_name, note, emotion.is_positive);
        self.store.append(entry).await;

        if emotion.is_positive {
            self.enter_state(SessionState::Idle);
        } else {
            // 保持LoggingEmotion，让记录界面先收起；延迟到期后进入活动选择
            self.bump_epoch();
            self.prompt_pending = true;
            self.spawn_prompt_delay();
        }
        Ok(self.state.clone())
    }

    /// 进入所选活动并启动对应计时器
    fn start_activity(&mut self, kind: ActivityKind) {
        match kind {
            ActivityKind::Breathing => {
                self.enter_state(SessionState::RunningBreathing {
                    phase: BreathingPhase::BreatheIn,
                    flips: 0,
                });
                self.spawn_breathing_timer();
            }
            ActivityKind::Exercising | ActivityKind::Journaling => {
                self.enter_state(SessionState::RunningTimedActivity {
                    kind,
                    remaining_secs: self.settings.countdown_secs,
                });
                self.spawn_countdown_timer();
            }
        }
    }

    /// 处理呼吸阶段切换tick，返回发送任务是否应继续
    fn handle_breathing_tick(&mut self, epoch: u64) -> bool {
        if epoch != self.timer_epoch {
            return false;
        }
        let SessionState::RunningBreathing { phase, flips } = self.state else {
            return false;
        };

        let flips = flips + 1;
        self.update_progress(SessionState::RunningBreathing {
            phase: phase.flipped(),
            flips,
        });

        if flips >= self.settings.breathing_flips {
            // 最后一次切换后停止翻转，收尾延迟到期时进入完成态
            self.spawn_completion_delay();
            return false;
        }
        true
    }

    /// 处理倒计时tick，返回发送任务是否应继续
    async fn handle_countdown_tick(&mut self, epoch: u64) -> bool {
        if epoch != self.timer_epoch {
            return false;
        }
        let SessionState::RunningTimedActivity {
            kind,
            remaining_secs,
        } = self.state
        else {
            return false;
        };

        // 归零恰好触发一次完成；完成时纪元递增，之后的tick全部过期
        let remaining_secs = remaining_secs.saturating_sub(1);
        if remaining_secs == 0 {
            self.complete(kind).await;
            return false;
        }
        self.update_progress(SessionState::RunningTimedActivity {
            kind,
            remaining_secs,
        });
        true
    }

    /// 活动完成（自然结束或跳过）：按当前记录历史计算生长阶段，置一次性动画标志
    async fn complete(&mut self, kind: ActivityKind) {
        let entries = self.store.all().await;
        let stage = growth::resolve_stage(&entries);
        self.enter_state(SessionState::Completed {
            stage,
            should_animate: true,
        });
        info!("疏导活动完成: {:?}，生长阶段: {:?}", kind, stage);
        self.event_bus
            .publish(AppEvent::ActivityCompleted { kind, stage });
    }

    /// 状态跃迁：递增纪元使所有未决计时器失效，并广播新状态
    fn enter_state(&mut self, next: SessionState) {
        self.bump_epoch();
        self.prompt_pending = false;
        debug!("会话状态跃迁: {:?} → {:?}", self.state, next);
        self.state = next;
        self.event_bus.publish(AppEvent::SessionStateChanged {
            state: self.state.clone(),
        });
    }

    /// 活动内部进度更新：不递增纪元，计时器继续有效
    fn update_progress(&mut self, next: SessionState) {
        self.state = next;
        self.event_bus.publish(AppEvent::SessionStateChanged {
            state: self.state.clone(),
        });
    }

    fn bump_epoch(&mut self) {
        self.timer_epoch += 1;
    }

    /// 负面提交后的一次性延迟
    fn spawn_prompt_delay(&self) {
        let sender = self.self_sender.clone();
        let epoch = self.timer_epoch;
        let delay = Duration::from_millis(self.settings.prompt_delay_ms);
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = sender
                .send(SessionCommand::PromptDelayElapsed { epoch })
                .await;
        });
    }

    /// 周期性呼吸阶段切换；Actor回复false或通道关闭时结束
    fn spawn_breathing_timer(&self) {
        let sender = self.self_sender.clone();
        let epoch = self.timer_epoch;
        let period = Duration::from_millis(self.settings.breathing_phase_ms);
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await; // 第一次tick立即返回，跳过
            loop {
                ticker.tick().await;
                let (reply, rx) = oneshot::channel();
                if sender
                    .send(SessionCommand::BreathingTick { epoch, reply })
                    .await
                    .is_err()
                {
                    break;
                }
                if !rx.await.unwrap_or(false) {
                    break;
                }
            }
        });
    }

    /// 每秒一步的倒计时；Actor回复false或通道关闭时结束
    fn spawn_countdown_timer(&self) {
        let sender = self.self_sender.clone();
        let epoch = self.timer_epoch;
        let period = Duration::from_millis(self.settings.countdown_tick_ms);
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await; // 第一次tick立即返回，跳过
            loop {
                ticker.tick().await;
                let (reply, rx) = oneshot::channel();
                if sender
                    .send(SessionCommand::CountdownTick { epoch, reply })
                    .await
                    .is_err()
                {
                    break;
                }
                if !rx.await.unwrap_or(false) {
                    break;
                }
            }
        });
    }

    /// 呼吸练习最后一次切换后的收尾延迟
    fn spawn_completion_delay(&self) {
        let sender = self.self_sender.clone();
        let epoch = self.timer_epoch;
        let delay = Duration::from_millis(self.settings.completion_delay_ms);
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = sender
                .send(SessionCommand::CompletionDelayElapsed { epoch })
                .await;
        });
    }
}

/// 记录会话Handle
#[derive(Clone)]
pub struct ActivitySessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl ActivitySessionHandle {
    /// 开始记录，返回变更后的状态
    pub async fn start_logging(&self) -> SessionState {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::StartLogging { reply })
            .await
            .ok();
        rx.await.unwrap_or_default()
    }

    /// 取消记录，返回变更后的状态
    pub async fn cancel(&self) -> SessionState {
        let (reply, rx) = oneshot::channel();
        self.sender.send(SessionCommand::Cancel { reply }).await.ok();
        rx.await.unwrap_or_default()
    }

    /// 提交情绪和备注
    ///
    /// 名称不在情绪表中时返回Err，不产生记录
    pub async fn submit(&self, emotion_name: &str, note: &str) -> Result<SessionState, String> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Submit {
                emotion_name: emotion_name.to_string(),
                note: note.to_string(),
                reply,
            })
            .await
            .ok();
        rx.await.unwrap_or_else(|_| {
            warn!("会话Actor未响应提交请求");
            Err("会话已停止".to_string())
        })
    }

    /// 选择疏导活动，返回变更后的状态
    pub async fn choose(&self, kind: ActivityKind) -> SessionState {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Choose { kind, reply })
            .await
            .ok();
        rx.await.unwrap_or_default()
    }

    /// 跳过当前活动，返回变更后的状态
    pub async fn skip(&self) -> SessionState {
        let (reply, rx) = oneshot::channel();
        self.sender.send(SessionCommand::Skip { reply }).await.ok();
        rx.await.unwrap_or_default()
    }

    /// 获取当前状态
    pub async fn state(&self) -> SessionState {
        let (reply, rx) = oneshot::channel();
        self.sender.send(SessionCommand::Get { reply }).await.ok();
        rx.await.unwrap_or_default()
    }

    /// 取走一次性动画提示；完成态且标志未消费时返回对应生长阶段
    pub async fn take_animation_hint(&self) -> Option<GrowthStage> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::TakeAnimationHint { reply })
            .await
            .ok();
        rx.await.unwrap_or(None)
    }

    /// 健康检查
    /// 返回true表示Actor正常运行，false表示Actor无响应或已停止
    /// 超时时间为5秒
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();

        if self
            .sender
            .send(SessionCommand::HealthCheck { reply })
            .await
            .is_err()
        {
            warn!("Activity Session Actor 健康检查失败: 通道已关闭");
            return false;
        }

        match tokio::time::timeout(std::time::Duration::from_secs(5), rx).await {
            Ok(Ok(())) => true,
            _ => {
                warn!("Activity Session Actor 健康检查失败: 无响应");
                false
            }
        }
    }
}
