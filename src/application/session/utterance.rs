//! Utterance Slot - 单一语音槽位

use tokio_util::sync::CancellationToken;

/// 当前语音槽位
///
/// 会话内最多存在一个活跃语音。每个可能发起新语音的入口（播放、
/// 切换音色、翻页、关闭）都先无条件顶替槽位内容；这是"最后写者
/// 获胜"策略而不是队列，语音可能在句中被打断。
///
/// 代数单调递增，用于丢弃被顶替语音的迟到完成消息。
#[derive(Debug)]
pub(crate) struct UtteranceSlot {
    generation: u64,
    cancel: CancellationToken,
}

impl UtteranceSlot {
    pub fn new() -> Self {
        Self {
            generation: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// 取消槽位中的语音并占据槽位，返回新代数
    pub fn supersede(&mut self) -> u64 {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
        self.generation
    }

    /// 当前占据槽位的语音的取消令牌
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 完成消息是否来自当前语音
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supersede_cancels_previous() {
        let mut slot = UtteranceSlot::new();
        let first = slot.token();
        let generation = slot.supersede();
        assert!(first.is_cancelled());
        assert!(!slot.token().is_cancelled());
        assert!(slot.is_current(generation));
    }

    #[test]
    fn test_generations_increase() {
        let mut slot = UtteranceSlot::new();
        let first = slot.supersede();
        let second = slot.supersede();
        assert!(second > first);
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
    }
}
