// Actor模块 - 使用Actor模式管理并发状态
//
// 用Actor模式替代Arc<Mutex<T>>，通过消息传递实现并发控制
// 会话状态只在Actor任务内变更，互斥由结构保证

pub mod activity_session;

pub use activity_session::{ActivitySessionActor, ActivitySessionHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::{AppEvent, EventBus};
    use crate::models::{ActivityKind, ActivitySettings, SessionState};
    use crate::storage::EntryStore;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::{sleep, Duration};
    use uuid::Uuid;

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir()
            .join("mood-tracker-tests")
            .join(format!("{}.json", Uuid::new_v4()))
    }

    /// 创建一套完整的会话环境并在后台运行Actor
    async fn spawn_session() -> (ActivitySessionHandle, Arc<EntryStore>, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new(256));
        let store = Arc::new(EntryStore::new(temp_store_path(), bus.clone()).await.unwrap());
        let (actor, handle) =
            ActivitySessionActor::new(store.clone(), bus.clone(), ActivitySettings::default());

        tokio::spawn(async move {
            actor.run().await;
        });

        (handle, store, bus)
    }

    /// 清空订阅者缓冲，统计其中疏导活动完成事件的数量
    fn drain_completed_count(
        receiver: &mut tokio::sync::broadcast::Receiver<AppEvent>,
    ) -> usize {
        let mut count = 0;
        loop {
            match receiver.try_recv() {
                Ok(AppEvent::ActivityCompleted { .. }) => count += 1,
                Ok(_) => {}
                Err(TryRecvError::Lagged(_)) => {}
                Err(_) => break,
            }
        }
        count
    }

    #[tokio::test]
    async fn test_session_health_check() {
        let (handle, _store, _bus) = spawn_session().await;

        let is_healthy = handle.health_check().await;
        assert!(is_healthy, "运行中的Actor应该是健康的");
    }

    #[tokio::test]
    async fn test_health_check_timeout() {
        // 创建Actor但不运行，模拟Actor无响应
        let bus = Arc::new(EventBus::new(16));
        let store = Arc::new(EntryStore::new(temp_store_path(), bus.clone()).await.unwrap());
        let (actor, handle) =
            ActivitySessionActor::new(store, bus, ActivitySettings::default());

        // 不运行Actor，直接drop
        drop(actor);

        let is_healthy = handle.health_check().await;
        assert!(!is_healthy, "停止的Actor应该健康检查失败");
    }

    #[tokio::test(start_paused = true)]
    async fn test_positive_submit_returns_to_idle() {
        let (handle, store, _bus) = spawn_session().await;

        handle.start_logging().await;
        let state = handle.submit("Happy", "不错的一天").await.unwrap();
        assert_eq!(state, SessionState::Idle);
        assert_eq!(store.count().await, 1);

        // 等待远超提示延迟的时间，正面提交永远不进入活动选择
        sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.state().await, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_submit_prompts_after_delay() {
        let (handle, store, _bus) = spawn_session().await;

        handle.start_logging().await;
        handle.submit("Sad", "").await.unwrap();

        let entries = store.all().await;
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].is_positive);
        assert!(entries[0].note.is_empty());

        // 延迟到期前仍在记录状态
        assert_eq!(handle.state().await, SessionState::LoggingEmotion);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.state().await, SessionState::PromptingCopingChoice);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_prompt_delay_stays_idle() {
        let (handle, _store, _bus) = spawn_session().await;

        handle.start_logging().await;
        handle.submit("Angry", "").await.unwrap();

        // 延迟期间取消，过期的延迟回调不得再触发活动选择
        let state = handle.cancel().await;
        assert_eq!(state, SessionState::Idle);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.state().await, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_submit_during_delay_window_ignored() {
        let (handle, store, _bus) = spawn_session().await;

        handle.start_logging().await;
        handle.submit("Sad", "").await.unwrap();

        // 延迟窗口内的重复提交不产生第二条记录
        let state = handle.submit("Angry", "再次提交").await.unwrap();
        assert_eq!(state, SessionState::LoggingEmotion);
        assert_eq!(store.count().await, 1);
        assert_eq!(store.all().await[0].emotion_name, "Sad");

        // 原有的延迟照常进入活动选择
        sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.state().await, SessionState::PromptingCopingChoice);
    }

    #[tokio::test]
    async fn test_submit_unknown_emotion_rejected() {
        let (handle, store, _bus) = spawn_session().await;

        handle.start_logging().await;
        let result = handle.submit("Melancholy", "").await;
        assert!(result.is_err());

        // 不产生记录，状态不变
        assert_eq!(store.count().await, 0);
        assert_eq!(handle.state().await, SessionState::LoggingEmotion);
    }

    #[tokio::test(start_paused = true)]
    async fn test_choose_is_noop_outside_prompt() {
        let (handle, _store, _bus) = spawn_session().await;

        // Idle
        handle.choose(ActivityKind::Breathing).await;
        assert_eq!(handle.state().await, SessionState::Idle);

        // LoggingEmotion
        handle.start_logging().await;
        handle.choose(ActivityKind::Exercising).await;
        assert_eq!(handle.state().await, SessionState::LoggingEmotion);

        // RunningTimedActivity
        handle.submit("Sad", "").await.unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.choose(ActivityKind::Exercising).await;
        handle.choose(ActivityKind::Breathing).await;
        assert!(matches!(
            handle.state().await,
            SessionState::RunningTimedActivity {
                kind: ActivityKind::Exercising,
                ..
            }
        ));

        // Completed
        handle.skip().await;
        let completed = handle.state().await;
        handle.choose(ActivityKind::Journaling).await;
        assert_eq!(handle.state().await, completed);

        // RunningBreathing
        handle.start_logging().await;
        handle.submit("Anxious", "").await.unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.choose(ActivityKind::Breathing).await;
        handle.choose(ActivityKind::Journaling).await;
        assert!(matches!(
            handle.state().await,
            SessionState::RunningBreathing { flips: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_skip_is_noop_when_no_activity_running() {
        let (handle, _store, _bus) = spawn_session().await;

        handle.skip().await;
        assert_eq!(handle.state().await, SessionState::Idle);

        handle.start_logging().await;
        handle.skip().await;
        assert_eq!(handle.state().await, SessionState::LoggingEmotion);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breathing_completes_after_ten_flips() {
        let (handle, _store, _bus) = spawn_session().await;

        handle.start_logging().await;
        handle.submit("Anxious", "").await.unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.choose(ActivityKind::Breathing).await;

        // 第9次切换发生在36秒，尚不能是完成态
        sleep(Duration::from_secs(39)).await;
        match handle.state().await {
            SessionState::RunningBreathing { flips, .. } => assert_eq!(flips, 9),
            other => panic!("应仍在呼吸练习中: {:?}", other),
        }

        // 第10次切换在40秒，收尾延迟1秒后完成
        sleep(Duration::from_millis(2100)).await;
        match handle.state().await {
            SessionState::Completed { should_animate, .. } => assert!(should_animate),
            other => panic!("应已完成: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_to_zero_and_completes_once() {
        let (handle, _store, bus) = spawn_session().await;
        let mut receiver = bus.subscribe();

        handle.start_logging().await;
        handle.submit("Tired", "").await.unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.choose(ActivityKind::Journaling).await;

        match handle.state().await {
            SessionState::RunningTimedActivity {
                kind,
                remaining_secs,
            } => {
                assert_eq!(kind, ActivityKind::Journaling);
                assert_eq!(remaining_secs, 900);
            }
            other => panic!("应在计时活动中: {:?}", other),
        }

        // 中途检查剩余秒数递减且不为负
        sleep(Duration::from_millis(5200)).await;
        match handle.state().await {
            SessionState::RunningTimedActivity { remaining_secs, .. } => {
                assert_eq!(remaining_secs, 895);
            }
            other => panic!("应在计时活动中: {:?}", other),
        }

        // 走完全程并多等一段时间，完成只触发一次
        sleep(Duration::from_secs(900)).await;
        match handle.state().await {
            SessionState::Completed { should_animate, .. } => assert!(should_animate),
            other => panic!("应已完成: {:?}", other),
        }

        sleep(Duration::from_secs(10)).await;
        assert_eq!(drain_completed_count(&mut receiver), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_cancels_pending_ticks() {
        let (handle, _store, bus) = spawn_session().await;

        handle.start_logging().await;
        handle.submit("Sad", "").await.unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.choose(ActivityKind::Exercising).await;

        let state = handle.skip().await;
        assert!(matches!(state, SessionState::Completed { .. }));

        // 跳过后不得再观察到任何倒计时进度事件
        let mut receiver = bus.subscribe();
        sleep(Duration::from_secs(10)).await;
        loop {
            match receiver.try_recv() {
                Ok(AppEvent::SessionStateChanged {
                    state: SessionState::RunningTimedActivity { .. },
                }) => panic!("跳过后倒计时仍在走动"),
                Ok(_) => {}
                Err(TryRecvError::Lagged(_)) => {}
                Err(_) => break,
            }
        }
        assert!(matches!(
            handle.state().await,
            SessionState::Completed { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_persists_until_next_logging() {
        let (handle, _store, _bus) = spawn_session().await;

        handle.start_logging().await;
        handle.submit("Angry", "").await.unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.choose(ActivityKind::Breathing).await;
        handle.skip().await;

        // 完成态保留，动画提示恰好被取走一次
        assert!(matches!(
            handle.state().await,
            SessionState::Completed {
                should_animate: true,
                ..
            }
        ));
        assert!(handle.take_animation_hint().await.is_some());
        assert!(handle.take_animation_hint().await.is_none());
        assert!(matches!(
            handle.state().await,
            SessionState::Completed {
                should_animate: false,
                ..
            }
        ));

        // 下一次开始记录从完成态直接进入记录状态
        let state = handle.start_logging().await;
        assert_eq!(state, SessionState::LoggingEmotion);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_negative_flow_scenario() {
        let (handle, store, _bus) = spawn_session().await;

        handle.start_logging().await;
        let state = handle.submit("Sad", "").await.unwrap();
        assert_eq!(state, SessionState::LoggingEmotion);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.state().await, SessionState::PromptingCopingChoice);

        let state = handle.choose(ActivityKind::Exercising).await;
        assert_eq!(
            state,
            SessionState::RunningTimedActivity {
                kind: ActivityKind::Exercising,
                remaining_secs: 900,
            }
        );

        let state = handle.skip().await;
        match state {
            SessionState::Completed {
                stage,
                should_animate,
            } => {
                assert!(should_animate);
                // 单条负面记录对应单叶负面阶段
                assert_eq!(stage, crate::models::GrowthStage::OneLeafNegative);
            }
            other => panic!("应已完成: {:?}", other),
        }
        assert_eq!(store.count().await, 1);
    }
}
