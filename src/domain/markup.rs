//! 共享的标记剥离器
//!
//! 页面文字允许携带简单 HTML 标记（由展示层渲染），朗读前需要还原为
//! 纯文本。标签按空白处理，避免相邻词语粘连；仅解码常见实体。

/// 从带标记的文本提取纯文本
///
/// 处理流程:
/// 1. 丢弃所有 `<...>` 标签，替换为空白
/// 2. 解码常见命名实体与数字实体
/// 3. 压缩连续空白为单个空格并去除首尾空白
pub fn strip_markup(input: &str) -> String {
    let mut raw = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                }
                raw.push(' ');
            }
            '&' => {
                let mut entity = String::new();
                let mut terminated = false;
                while let Some(&next) = chars.peek() {
                    if next == ';' {
                        chars.next();
                        terminated = true;
                        break;
                    }
                    // 实体不会跨越标签或新的实体；过长则按普通文本处理
                    if next == '&' || next == '<' || entity.len() >= 10 {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }
                match decode_entity(&entity) {
                    Some(decoded) if terminated => raw.push(decoded),
                    _ => {
                        raw.push('&');
                        raw.push_str(&entity);
                        if terminated {
                            raw.push(';');
                        }
                    }
                }
            }
            _ => raw.push(c),
        }
    }

    collapse_whitespace(&raw)
}

/// 解码单个实体（不含 `&` 与 `;`）
fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = if let Some(hex) = code.strip_prefix('x').or_else(|| code.strip_prefix('X'))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                code.parse::<u32>().ok()?
            };
            char::from_u32(value)
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
