//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

/// 可选音色类型
///
/// 固定的四种音色身份，展示名即持久化值（与历史偏好数据兼容）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceKind {
    /// 温柔女声
    GentleFemale,
    /// 活泼童声
    LivelyChild,
    /// 磁性男声
    MagneticMale,
    /// 慈祥奶奶
    KindlyGrandma,
}

impl VoiceKind {
    pub const ALL: [VoiceKind; 4] = [
        VoiceKind::GentleFemale,
        VoiceKind::LivelyChild,
        VoiceKind::MagneticMale,
        VoiceKind::KindlyGrandma,
    ];

    /// 展示名（同时作为持久化值）
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceKind::GentleFemale => "温柔女声",
            VoiceKind::LivelyChild => "活泼童声",
            VoiceKind::MagneticMale => "磁性男声",
            VoiceKind::KindlyGrandma => "慈祥奶奶",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }

    /// 音色参数表
    pub fn profile(&self) -> VoiceProfile {
        match self {
            VoiceKind::GentleFemale => VoiceProfile {
                kind: *self,
                lang: "zh-CN",
                gender: Gender::Female,
                pitch: None,
                rate: None,
            },
            VoiceKind::LivelyChild => VoiceProfile {
                kind: *self,
                lang: "zh-CN",
                gender: Gender::Female,
                pitch: Some(1.2),
                rate: None,
            },
            VoiceKind::MagneticMale => VoiceProfile {
                kind: *self,
                lang: "zh-CN",
                gender: Gender::Male,
                pitch: None,
                rate: None,
            },
            VoiceKind::KindlyGrandma => VoiceProfile {
                kind: *self,
                lang: "zh-CN",
                gender: Gender::Female,
                pitch: Some(0.9),
                rate: None,
            },
        }
    }
}

impl Default for VoiceKind {
    fn default() -> Self {
        VoiceKind::GentleFemale
    }
}

impl std::fmt::Display for VoiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 性别（用于引擎音色启发式匹配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

/// 音色参数档案
///
/// 语言标签、性别与可选的音调/语速覆写；语速缺省时由会话配置
/// 提供一个略慢于正常的默认值，更适合跟读。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceProfile {
    pub kind: VoiceKind,
    pub lang: &'static str,
    pub gender: Gender,
    pub pitch: Option<f32>,
    pub rate: Option<f32>,
}
