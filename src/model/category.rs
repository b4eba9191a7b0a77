use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// CEFR proficiency tag attached to every record.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    pub const ALL: [Level; 6] = [Level::A1, Level::A2, Level::B1, Level::B2, Level::C1, Level::C2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown level {s:?}"))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic label shared by vocabulary and reading passages.
///
/// Labels were authored by hand across several sessions and drifted
/// (`方位` vs `方位词`, `餐饮` vs `食物餐饮`, ...). Every variant owns one
/// canonical label, which is what gets written, plus the aliases that are
/// folded into it when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    DailyPhrases,
    DailyLife,
    FoodDrink,
    WorkStudy,
    Professions,
    Numbers,
    Time,
    Weekdays,
    Months,
    BodyParts,
    Clothing,
    Colors,
    Emotions,
    Weather,
    Directions,
    Transport,
    CityPlaces,
    Shopping,
    Housing,
    Rooms,
    Furniture,
    Leisure,
    Culture,
    Travel,
    Health,
    Verbs,
    Technology,
    Abstract,
    Social,
    PracticalTexts,
}

const CATEGORY_TABLE: &[(Category, &str, &[&str])] = &[
    (Category::DailyPhrases, "日常用语", &[]),
    (Category::DailyLife, "日常生活", &[]),
    (Category::FoodDrink, "食物餐饮", &["餐饮"]),
    (Category::WorkStudy, "工作学习", &["工作", "学习"]),
    (Category::Professions, "职业", &["身份"]),
    (Category::Numbers, "数字", &[]),
    (Category::Time, "时间", &[]),
    (Category::Weekdays, "星期", &[]),
    (Category::Months, "月份", &[]),
    (Category::BodyParts, "身体部位", &[]),
    (Category::Clothing, "衣物", &[]),
    (Category::Colors, "颜色", &[]),
    (Category::Emotions, "情绪", &[]),
    (Category::Weather, "天气", &[]),
    (Category::Directions, "方位", &["方位词"]),
    (Category::Transport, "交通", &["出行"]),
    (Category::CityPlaces, "城市设施", &[]),
    (Category::Shopping, "购物", &[]),
    (Category::Housing, "居住", &["住宿", "房屋"]),
    (Category::Rooms, "房间", &[]),
    (Category::Furniture, "家具", &[]),
    (Category::Leisure, "娱乐运动", &["运动", "娱乐", "休闲", "户外"]),
    (Category::Culture, "文化", &["宗教"]),
    (Category::Travel, "旅游", &[]),
    (Category::Health, "健康", &[]),
    (Category::Verbs, "动词", &[]),
    (Category::Technology, "通讯科技", &[]),
    (Category::Abstract, "抽象概念", &[]),
    (Category::Social, "社交关系", &[]),
    (Category::PracticalTexts, "实用文本", &[]),
];

impl Category {
    pub fn label(&self) -> &'static str {
        CATEGORY_TABLE
            .iter()
            .find(|(c, _, _)| c == self)
            .map(|(_, label, _)| *label)
            .unwrap_or("")
    }

    pub fn all() -> impl Iterator<Item = Category> {
        CATEGORY_TABLE.iter().map(|(c, _, _)| *c)
    }

    /// Resolves a canonical label or a known alias.
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        CATEGORY_TABLE
            .iter()
            .find(|(_, canonical, aliases)| *canonical == label || aliases.contains(&label))
            .map(|(c, _, _)| *c)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| format!("unknown category {s:?}"))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
