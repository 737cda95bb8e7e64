//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, auth::UserID, database_id::CategoryId};

/// The icon shown for new categories when none is given.
pub const DEFAULT_CATEGORY_ICON: &str = "📦";
/// The icon shown for transactions whose category has been deleted.
pub const UNKNOWN_CATEGORY_ICON: &str = "❓";
/// The name shown for transactions whose category has been deleted.
pub const UNKNOWN_CATEGORY_NAME: &str = "不明";

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category icon, exactly one user-perceived character such as "🍰" or "👨‍👩‍👧".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CategoryIcon(String);

impl CategoryIcon {
    /// Create a category icon. An empty string gives the default icon.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidCategoryIcon] if `icon` is more than one grapheme cluster.
    pub fn new(icon: &str) -> Result<Self, Error> {
        let icon = icon.trim();

        match icon.graphemes(true).count() {
            0 => Ok(Self::default()),
            1 => Ok(Self(icon.to_owned())),
            _ => Err(Error::InvalidCategoryIcon(icon.to_owned())),
        }
    }

    /// Create a category icon without validation.
    pub fn new_unchecked(icon: &str) -> Self {
        Self(icon.to_owned())
    }
}

impl Default for CategoryIcon {
    fn default() -> Self {
        Self(DEFAULT_CATEGORY_ICON.to_owned())
    }
}

impl AsRef<str> for CategoryIcon {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed palette of category colours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryColor {
    Rose,
    Pink,
    Orange,
    Amber,
    Emerald,
    #[default]
    Teal,
    Sky,
    Indigo,
    Violet,
    Gray,
}

impl CategoryColor {
    /// Every colour in the order they are offered to the user.
    pub const ALL: [CategoryColor; 10] = [
        CategoryColor::Rose,
        CategoryColor::Pink,
        CategoryColor::Orange,
        CategoryColor::Amber,
        CategoryColor::Emerald,
        CategoryColor::Teal,
        CategoryColor::Sky,
        CategoryColor::Indigo,
        CategoryColor::Violet,
        CategoryColor::Gray,
    ];

    /// The name used in forms and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryColor::Rose => "rose",
            CategoryColor::Pink => "pink",
            CategoryColor::Orange => "orange",
            CategoryColor::Amber => "amber",
            CategoryColor::Emerald => "emerald",
            CategoryColor::Teal => "teal",
            CategoryColor::Sky => "sky",
            CategoryColor::Indigo => "indigo",
            CategoryColor::Violet => "violet",
            CategoryColor::Gray => "gray",
        }
    }

    /// Tailwind classes for an icon badge in this colour.
    ///
    /// The class names are spelled out in full so that Tailwind picks them up.
    pub fn badge_style(&self) -> &'static str {
        match self {
            CategoryColor::Rose => "bg-rose-100 text-rose-600",
            CategoryColor::Pink => "bg-pink-100 text-pink-600",
            CategoryColor::Orange => "bg-orange-100 text-orange-600",
            CategoryColor::Amber => "bg-amber-100 text-amber-600",
            CategoryColor::Emerald => "bg-emerald-100 text-emerald-600",
            CategoryColor::Teal => "bg-teal-100 text-teal-600",
            CategoryColor::Sky => "bg-sky-100 text-sky-600",
            CategoryColor::Indigo => "bg-indigo-100 text-indigo-600",
            CategoryColor::Violet => "bg-violet-100 text-violet-600",
            CategoryColor::Gray => "bg-gray-100 text-gray-600",
        }
    }

    /// Tailwind class for a solid swatch in this colour.
    pub fn swatch_style(&self) -> &'static str {
        match self {
            CategoryColor::Rose => "bg-rose-400",
            CategoryColor::Pink => "bg-pink-400",
            CategoryColor::Orange => "bg-orange-400",
            CategoryColor::Amber => "bg-amber-400",
            CategoryColor::Emerald => "bg-emerald-400",
            CategoryColor::Teal => "bg-teal-400",
            CategoryColor::Sky => "bg-sky-400",
            CategoryColor::Indigo => "bg-indigo-400",
            CategoryColor::Violet => "bg-violet-400",
            CategoryColor::Gray => "bg-gray-400",
        }
    }
}

impl FromStr for CategoryColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryColor::ALL
            .into_iter()
            .find(|color| color.as_str() == s)
            .ok_or_else(|| Error::InvalidColor(s.to_owned()))
    }
}

impl Display for CategoryColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A budget bucket with a monthly allowance in whole yen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserID,
    pub name: CategoryName,
    pub icon: CategoryIcon,
    pub color: CategoryColor,
    /// The monthly budget in yen, never negative.
    pub budget: i64,
    /// Categories are listed in ascending order of this value.
    pub display_order: i64,
}

/// The validated fields of a category that the user can edit.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFields {
    pub name: CategoryName,
    pub icon: CategoryIcon,
    pub color: CategoryColor,
    pub budget: i64,
}

/// A category that every user starts with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: CategoryColor,
    pub budget: i64,
}

/// The categories seeded for a user with no categories, in display order.
pub const DEFAULT_CATEGORIES: [DefaultCategory; 6] = [
    DefaultCategory {
        name: "食費",
        icon: "🍰",
        color: CategoryColor::Orange,
        budget: 40_000,
    },
    DefaultCategory {
        name: "日用品",
        icon: "🎀",
        color: CategoryColor::Sky,
        budget: 10_000,
    },
    DefaultCategory {
        name: "交通費",
        icon: "👠",
        color: CategoryColor::Emerald,
        budget: 15_000,
    },
    DefaultCategory {
        name: "交際費",
        icon: "🥂",
        color: CategoryColor::Pink,
        budget: 20_000,
    },
    DefaultCategory {
        name: "趣味",
        icon: "💄",
        color: CategoryColor::Violet,
        budget: 10_000,
    },
    DefaultCategory {
        name: "固定費",
        icon: "🏠",
        color: CategoryColor::Gray,
        budget: 80_000,
    },
];

impl From<&DefaultCategory> for CategoryFields {
    fn from(value: &DefaultCategory) -> Self {
        Self {
            name: CategoryName::new_unchecked(value.name),
            icon: CategoryIcon::new_unchecked(value.icon),
            color: value.color,
            budget: value.budget,
        }
    }
}

/// Form data for category creation and editing.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub budget: String,
}

impl CategoryFormData {
    /// Validate the raw form values.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, in field order.
    pub fn parse(&self) -> Result<CategoryFields, Error> {
        let name = CategoryName::new(&self.name)?;
        let icon = CategoryIcon::new(&self.icon)?;
        let color = if self.color.is_empty() {
            CategoryColor::default()
        } else {
            self.color.parse()?
        };
        let budget = crate::transaction::parse_yen(&self.budget)?;

        Ok(CategoryFields {
            name,
            icon,
            color,
            budget,
        })
    }
}
