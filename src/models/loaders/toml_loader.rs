use std::path::Path;

use tokio::fs;

use crate::error::{AppResult, FileError};
use crate::models::catalog::Catalog;

/// 解析 TOML 文本为课程目录
///
/// 结构无效的测验会被跳过并记录警告，不影响其他内容。
pub fn parse_catalog(content: &str, source: &str) -> AppResult<Catalog> {
    let mut catalog: Catalog = toml::from_str(content).map_err(|e| FileError::TomlParseFailed {
        path: source.to_string(),
        source: e,
    })?;

    catalog.quizzes.retain(|quiz| match quiz.validate() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("跳过无效测验 {}: {}", quiz.id, e);
            false
        }
    });

    Ok(catalog)
}

/// 从 TOML 文件加载课程目录
pub async fn load_catalog(path: &Path) -> AppResult<Catalog> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(FileError::NotFound { path: display }.into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FileError::ReadFailed {
            path: display.clone(),
            source: e,
        })?;

    let mut catalog = parse_catalog(&content, &display)?;
    catalog.file_path = Some(display);

    tracing::info!(
        "成功加载 {} 个模块, {} 个测验",
        catalog.modules.len(),
        catalog.quizzes.len()
    );

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::catalog::ContentItem;

    const CATALOG: &str = r#"
[[modules]]
id = "intro-to-algebra"
title = "Introduction to Algebra"
estimated_time = "2 hours"

[[modules.content]]
type = "text"
value = "Welcome to Algebra!"

[[modules.content]]
type = "image"
value = "https://placehold.co/600x300.png"
alt_text = "Example of an algebraic equation"

[[quizzes]]
id = "algebra-quiz-1"
module_id = "intro-to-algebra"
title = "Algebra Basics Quiz"

[[quizzes.questions]]
id = "q1"
text = "What is a variable in algebra?"
correct_option_id = "opt2"
options = [
    { id = "opt1", text = "A fixed number" },
    { id = "opt2", text = "A symbol representing an unknown value" },
]

[[quizzes]]
id = "broken"
title = "Broken"

[[quizzes.questions]]
id = "q1"
text = "?"
correct_option_id = "missing"
options = [{ id = "opt1", text = "only one" }]
"#;

    #[test]
    fn test_parse_catalog_skips_invalid_quizzes() {
        let catalog = parse_catalog(CATALOG, "inline").unwrap();

        assert_eq!(catalog.modules.len(), 1);
        let module = catalog.module("intro-to-algebra").unwrap();
        assert_eq!(module.content.len(), 2);
        assert!(matches!(
            &module.content[1],
            ContentItem::Image { alt_text: Some(_), .. }
        ));

        assert!(catalog.quiz("algebra-quiz-1").is_some());
        assert!(catalog.quiz("broken").is_none());
        assert_eq!(catalog.quizzes_for_module("intro-to-algebra").count(), 1);
    }

    #[test]
    fn test_parse_catalog_reports_toml_errors() {
        let err = parse_catalog("[[modules]\nid = ", "bad.toml").unwrap_err();
        assert!(matches!(err, AppError::File(FileError::TomlParseFailed { .. })));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_catalog(Path::new("does/not/exist.toml")).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_load_bundled_catalog() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/catalog.toml");
        let catalog = load_catalog(&path).await.unwrap();
        assert!(catalog.quiz("algebra-quiz-1").is_some());
        assert!(catalog.file_path.is_some());
    }
}
