//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 固定音色身份与参数表
//! - 供会话层做引擎音色匹配的元数据

mod value_objects;

pub use value_objects::{Gender, VoiceKind, VoiceProfile};
