//! Voice Select - 引擎音色匹配

use crate::application::ports::AvailableVoice;
use crate::domain::voice::{Gender, VoiceProfile};

/// 为音色档案挑选最合适的引擎音色
///
/// 匹配策略:
/// 1. 优先限定中文音色；一个都没有时退回全部音色
/// 2. 按性别关键词过滤（引擎音色名没有结构化的性别信息）
/// 3. 取第一个命中；性别全部落空时退回语言池的第一个
///
/// 列表为空时返回 None，由引擎使用默认音色。
pub fn pick_best_voice<'a>(
    profile: &VoiceProfile,
    voices: &'a [AvailableVoice],
) -> Option<&'a AvailableVoice> {
    if voices.is_empty() {
        return None;
    }

    let chinese: Vec<&AvailableVoice> = voices.iter().filter(|v| v.lang.contains("zh")).collect();
    let pool: Vec<&AvailableVoice> = if chinese.is_empty() {
        voices.iter().collect()
    } else {
        chinese
    };

    let by_gender: Vec<&AvailableVoice> = pool
        .iter()
        .copied()
        .filter(|v| matches_gender(&v.name, profile.gender))
        .collect();

    if by_gender.is_empty() {
        pool.first().copied()
    } else {
        by_gender.first().copied()
    }
}

/// 音色名性别启发式
///
/// "male" 是 "female" 的子串，必须先排除女声关键词再判断男声。
fn matches_gender(name: &str, gender: Gender) -> bool {
    let name = name.to_lowercase();
    let female = ["female", "woman", "huihui", "yaoyao"]
        .iter()
        .any(|hint| name.contains(hint));
    match gender {
        Gender::Female => female,
        Gender::Male => {
            !female
                && ["male", "man", "kangkang", "云扬"]
                    .iter()
                    .any(|hint| name.contains(hint))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::VoiceKind;

    fn voice(name: &str, lang: &str) -> AvailableVoice {
        AvailableVoice {
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }

    #[test]
    fn test_empty_list_returns_none() {
        let profile = VoiceKind::GentleFemale.profile();
        assert_eq!(pick_best_voice(&profile, &[]), None);
    }

    #[test]
    fn test_prefers_chinese_voices() {
        let voices = vec![
            voice("English Female", "en-US"),
            voice("Microsoft Huihui", "zh-CN"),
        ];
        let profile = VoiceKind::GentleFemale.profile();
        assert_eq!(
            pick_best_voice(&profile, &voices).unwrap().name,
            "Microsoft Huihui"
        );
    }

    #[test]
    fn test_gender_filter() {
        let voices = vec![
            voice("Microsoft Huihui (female)", "zh-CN"),
            voice("Microsoft Kangkang (male)", "zh-CN"),
        ];
        let male = VoiceKind::MagneticMale.profile();
        assert_eq!(
            pick_best_voice(&male, &voices).unwrap().name,
            "Microsoft Kangkang (male)"
        );
        let female = VoiceKind::GentleFemale.profile();
        assert_eq!(
            pick_best_voice(&female, &voices).unwrap().name,
            "Microsoft Huihui (female)"
        );
    }

    #[test]
    fn test_female_name_not_mistaken_for_male() {
        let voices = vec![voice("Gentle Woman", "zh-CN")];
        let male = VoiceKind::MagneticMale.profile();
        // 没有男声时退回语言池的第一个
        assert_eq!(pick_best_voice(&male, &voices).unwrap().name, "Gentle Woman");
    }

    #[test]
    fn test_falls_back_to_any_language() {
        let voices = vec![voice("English Man", "en-US")];
        let male = VoiceKind::MagneticMale.profile();
        assert_eq!(pick_best_voice(&male, &voices).unwrap().name, "English Man");
    }
}
