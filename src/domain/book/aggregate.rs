//! Book Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookError, BookTitle, ImageRef, Page, PageText};

/// Book 聚合根
///
/// 不变量:
/// - 至少包含一页
/// - 页码始终等于页面位置 + 1（增删页后由聚合重新编号）
/// - 阅读会话期间除就地文字编辑外内容不变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    title: BookTitle,
    pages: Vec<Page>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    /// 创建绘本；页码按传入顺序重新编号
    pub fn new(title: BookTitle, pages: Vec<Page>) -> Result<Self, BookError> {
        if pages.is_empty() {
            return Err(BookError::EmptyBook);
        }
        let now = Utc::now();
        let mut book = Self {
            title,
            pages,
            created_at: now,
            updated_at: now,
        };
        book.renumber();
        Ok(book)
    }

    /// 从 (插图, 文字) 序列创建绘本
    pub fn from_pages(
        title: BookTitle,
        pages: Vec<(ImageRef, PageText)>,
    ) -> Result<Self, BookError> {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(position, (image, text))| Page::new(position as u32 + 1, image, text))
            .collect();
        Self::new(title, pages)
    }

    /// 追加一页到末尾
    pub fn push_page(&mut self, image: ImageRef, text: PageText) {
        let number = self.pages.len() as u32 + 1;
        self.pages.push(Page::new(number, image, text));
        self.updated_at = Utc::now();
    }

    /// 在指定页码处插入一页，原页面依次后移
    pub fn insert_page(
        &mut self,
        number: u32,
        image: ImageRef,
        text: PageText,
    ) -> Result<(), BookError> {
        if number < 1 || number > self.page_count() + 1 {
            return Err(BookError::PageOutOfRange {
                number,
                page_count: self.page_count(),
            });
        }
        self.pages
            .insert(number as usize - 1, Page::new(number, image, text));
        self.renumber();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 删除指定页；不允许删除仅剩的一页
    pub fn remove_page(&mut self, number: u32) -> Result<Page, BookError> {
        if number < 1 || number > self.page_count() {
            return Err(BookError::PageOutOfRange {
                number,
                page_count: self.page_count(),
            });
        }
        if self.pages.len() == 1 {
            return Err(BookError::LastPage);
        }
        let removed = self.pages.remove(number as usize - 1);
        self.renumber();
        self.updated_at = Utc::now();
        Ok(removed)
    }

    /// 就地修改某页文字
    pub fn set_page_text(&mut self, number: u32, text: PageText) -> Result<(), BookError> {
        let page_count = self.page_count();
        if number < 1 {
            return Err(BookError::PageOutOfRange { number, page_count });
        }
        let page = self
            .pages
            .get_mut(number as usize - 1)
            .ok_or(BookError::PageOutOfRange { number, page_count })?;
        page.set_text(text);
        self.updated_at = Utc::now();
        Ok(())
    }

    // Getters
    pub fn title(&self) -> &BookTitle {
        &self.title
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// 按页码取页（1 起始）
    pub fn page(&self, number: u32) -> Option<&Page> {
        if number < 1 {
            return None;
        }
        self.pages.get(number as usize - 1)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 恢复页码不变量：页码 = 位置 + 1
    fn renumber(&mut self) {
        for (position, page) in self.pages.iter_mut().enumerate() {
            page.set_number(position as u32 + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_book(page_texts: &[&str]) -> Book {
        let title = BookTitle::new("测试绘本").unwrap();
        let pages = page_texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                (
                    ImageRef::from(format!("images/{}.png", i + 1)),
                    PageText::new(*text).unwrap(),
                )
            })
            .collect();
        Book::from_pages(title, pages).unwrap()
    }

    #[test]
    fn test_book_requires_at_least_one_page() {
        let title = BookTitle::new("空书").unwrap();
        assert!(matches!(
            Book::from_pages(title, Vec::new()),
            Err(BookError::EmptyBook)
        ));
    }

    #[test]
    fn test_page_numbers_follow_position() {
        let book = make_book(&["第一页", "第二页", "第三页"]);
        assert_eq!(book.page_count(), 3);
        for (i, page) in book.pages().iter().enumerate() {
            assert_eq!(page.number(), i as u32 + 1);
        }
        assert_eq!(book.page(2).unwrap().text().as_str(), "第二页");
        assert!(book.page(0).is_none());
        assert!(book.page(4).is_none());
    }

    #[test]
    fn test_insert_renumbers() {
        let mut book = make_book(&["第一页", "第三页"]);
        book.insert_page(
            2,
            ImageRef::from("images/new.png"),
            PageText::new("第二页").unwrap(),
        )
        .unwrap();
        assert_eq!(book.page_count(), 3);
        assert_eq!(book.page(2).unwrap().text().as_str(), "第二页");
        assert_eq!(book.page(3).unwrap().text().as_str(), "第三页");
        assert_eq!(book.page(3).unwrap().number(), 3);
    }

    #[test]
    fn test_remove_renumbers_and_protects_last_page() {
        let mut book = make_book(&["第一页", "第二页", "第三页"]);
        let removed = book.remove_page(2).unwrap();
        assert_eq!(removed.text().as_str(), "第二页");
        assert_eq!(book.page_count(), 2);
        assert_eq!(book.page(2).unwrap().text().as_str(), "第三页");
        assert_eq!(book.page(2).unwrap().number(), 2);

        book.remove_page(1).unwrap();
        assert!(matches!(book.remove_page(1), Err(BookError::LastPage)));
    }

    #[test]
    fn test_set_page_text() {
        let mut book = make_book(&["旧文字"]);
        book.set_page_text(1, PageText::new("新文字").unwrap())
            .unwrap();
        assert_eq!(book.page(1).unwrap().text().as_str(), "新文字");
        assert!(book.set_page_text(2, PageText::new("越界").unwrap()).is_err());
    }
}
