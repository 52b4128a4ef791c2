use phf::phf_map;

/// 学科图标（闭集，前端按变体选择渲染）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Icon {
    Languages,
    Leaf,
    Atom,
    Calculator,
    BookOpen,
    BookCopy,
    Computer,
    Cpu,
    Brain,
    Globe2,
    Banknote,
    Landmark,
    Palette,
    /// 默认图标
    #[default]
    Book,
}

static SUBJECTS_BY_ID: phf::Map<&'static str, Subject> = phf_map! {
    "arabic" => Subject::ArabicLiterature,
    "natural-sciences" => Subject::NaturalSciences,
    "physics" => Subject::Physics,
    "math" => Subject::Math,
    "islamic-studies" => Subject::IslamicStudies,
    "foreign-lang-3" => Subject::ThirdForeignLanguage,
    "english" => Subject::English,
    "french" => Subject::French,
    "informatics" => Subject::Informatics,
    "technology" => Subject::Technology,
    "philosophy" => Subject::Philosophy,
    "history-geo" => Subject::HistoryGeography,
    "accounting" => Subject::Accounting,
};

static SUBJECTS_BY_NAME: phf::Map<&'static str, Subject> = phf_map! {
    "أدب عربي" => Subject::ArabicLiterature,
    "علوم طبيعية" => Subject::NaturalSciences,
    "فيزياء" => Subject::Physics,
    "رياضيات" => Subject::Math,
    "العلوم الاسلامية" => Subject::IslamicStudies,
    "لغة أجنبية ثالثة" => Subject::ThirdForeignLanguage,
    "لغة انجليزية" => Subject::English,
    "لغة فرنسية" => Subject::French,
    "إعلام آلي" => Subject::Informatics,
    "التكنولوجيا" => Subject::Technology,
    "فلسفة" => Subject::Philosophy,
    "تاريخ وجغرافيا" => Subject::HistoryGeography,
    "تسيير واقتصاد" => Subject::Accounting,
};

/// 学科分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Subject {
    /// 阿拉伯文学
    ArabicLiterature,
    /// 自然科学
    NaturalSciences,
    /// 物理
    Physics,
    /// 数学
    Math,
    /// 伊斯兰学
    IslamicStudies,
    /// 第三外语
    ThirdForeignLanguage,
    /// 英语
    English,
    /// 法语
    French,
    /// 信息技术
    Informatics,
    /// 工程技术
    Technology,
    /// 哲学
    Philosophy,
    /// 历史与地理
    HistoryGeography,
    /// 管理与经济
    Accounting,
}

impl Subject {
    pub const ALL: [Subject; 13] = [
        Subject::ArabicLiterature,
        Subject::NaturalSciences,
        Subject::Physics,
        Subject::Math,
        Subject::IslamicStudies,
        Subject::ThirdForeignLanguage,
        Subject::English,
        Subject::French,
        Subject::Informatics,
        Subject::Technology,
        Subject::Philosophy,
        Subject::HistoryGeography,
        Subject::Accounting,
    ];

    /// 获取学科 id（URL 中使用）
    pub fn id(self) -> &'static str {
        match self {
            Subject::ArabicLiterature => "arabic",
            Subject::NaturalSciences => "natural-sciences",
            Subject::Physics => "physics",
            Subject::Math => "math",
            Subject::IslamicStudies => "islamic-studies",
            Subject::ThirdForeignLanguage => "foreign-lang-3",
            Subject::English => "english",
            Subject::French => "french",
            Subject::Informatics => "informatics",
            Subject::Technology => "technology",
            Subject::Philosophy => "philosophy",
            Subject::HistoryGeography => "history-geo",
            Subject::Accounting => "accounting",
        }
    }

    /// 获取阿拉伯语显示名称
    pub fn name(self) -> &'static str {
        match self {
            Subject::ArabicLiterature => "أدب عربي",
            Subject::NaturalSciences => "علوم طبيعية",
            Subject::Physics => "فيزياء",
            Subject::Math => "رياضيات",
            Subject::IslamicStudies => "العلوم الاسلامية",
            Subject::ThirdForeignLanguage => "لغة أجنبية ثالثة",
            Subject::English => "لغة انجليزية",
            Subject::French => "لغة فرنسية",
            Subject::Informatics => "إعلام آلي",
            Subject::Technology => "التكنولوجيا",
            Subject::Philosophy => "فلسفة",
            Subject::HistoryGeography => "تاريخ وجغرافيا",
            Subject::Accounting => "تسيير واقتصاد",
        }
    }

    pub fn icon(self) -> Icon {
        match self {
            Subject::ArabicLiterature | Subject::English | Subject::French => Icon::Languages,
            Subject::NaturalSciences => Icon::Leaf,
            Subject::Physics => Icon::Atom,
            Subject::Math => Icon::Calculator,
            Subject::IslamicStudies => Icon::BookOpen,
            Subject::ThirdForeignLanguage => Icon::BookCopy,
            Subject::Informatics => Icon::Computer,
            Subject::Technology => Icon::Cpu,
            Subject::Philosophy => Icon::Brain,
            Subject::HistoryGeography => Icon::Globe2,
            Subject::Accounting => Icon::Banknote,
        }
    }

    /// 从 id 解析学科
    pub fn from_id(id: &str) -> Option<Self> {
        SUBJECTS_BY_ID.get(id.trim()).copied()
    }

    /// 从显示名称解析学科（问题表单里保存的是显示名称）
    pub fn from_name(name: &str) -> Option<Self> {
        SUBJECTS_BY_NAME.get(name.trim()).copied()
    }

    /// 按 id 或显示名称查找，得到图标；未知学科使用默认图标
    pub fn icon_for(key: &str) -> Icon {
        Self::from_id(key)
            .or_else(|| Self::from_name(key))
            .map(Subject::icon)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_round_trip_by_id_and_name() {
        for subject in Subject::ALL {
            assert_eq!(Subject::from_id(subject.id()), Some(subject));
            assert_eq!(Subject::from_name(subject.name()), Some(subject));
        }
        assert_eq!(Subject::from_name(" فيزياء "), Some(Subject::Physics));
        assert_eq!(Subject::from_id("astronomy"), None);
    }

    #[test]
    fn test_icon_fallback() {
        assert_eq!(Icon::default(), Icon::Book);
        assert_eq!(Subject::icon_for("physics"), Icon::Atom);
        assert_eq!(Subject::icon_for("رياضيات"), Icon::Calculator);
        assert_eq!(Subject::icon_for("astronomy"), Icon::Book);
    }
}
