use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShiftDirection {
    Left,
    Up,
    Down,
    Right,
}

impl ShiftDirection {
    pub fn axis(self) -> Axis {
        match self {
            ShiftDirection::Left | ShiftDirection::Right => Axis::Horizontal,
            ShiftDirection::Up | ShiftDirection::Down => Axis::Vertical,
        }
    }

    pub fn opposite(self) -> ShiftDirection {
        match self {
            ShiftDirection::Left => ShiftDirection::Right,
            ShiftDirection::Right => ShiftDirection::Left,
            ShiftDirection::Up => ShiftDirection::Down,
            ShiftDirection::Down => ShiftDirection::Up,
        }
    }

    /// Right and down walk towards the end of a child list.
    pub fn is_forward(self) -> bool { matches!(self, ShiftDirection::Right | ShiftDirection::Down) }
}

/// Corner being dragged during a pointer resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResizeCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeCorner {
    pub fn horizontal_edge(self) -> ShiftDirection {
        match self {
            ResizeCorner::TopLeft | ResizeCorner::BottomLeft => ShiftDirection::Left,
            ResizeCorner::TopRight | ResizeCorner::BottomRight => ShiftDirection::Right,
        }
    }

    pub fn vertical_edge(self) -> ShiftDirection {
        match self {
            ResizeCorner::TopLeft | ResizeCorner::TopRight => ShiftDirection::Up,
            ResizeCorner::BottomLeft | ResizeCorner::BottomRight => ShiftDirection::Down,
        }
    }
}

/// Targets of the focus ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FocusShift {
    /// The workspace root.
    Top,
    /// The focused leaf.
    Bottom,
    /// One level up.
    Raise,
    /// One level down.
    Lower,
    /// The nearest tabbed ancestor. A tabbed workspace root qualifies.
    Tab,
    /// The child of the nearest tabbed ancestor containing focus.
    TabNode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabFocus {
    MouseLocation,
    Left,
    Right,
    /// 1-based tab position.
    Index(usize),
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TabFocusMousePriority {
    #[default]
    Ignore,
    Prioritize,
    Require,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TabLockMode {
    Lock,
    Unlock,
    #[default]
    Toggle,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SetSwallowOption {
    NoSwallow,
    Swallow,
    #[default]
    Toggle,
}

impl SetSwallowOption {
    pub fn apply(self, current: bool) -> bool {
        match self {
            SetSwallowOption::NoSwallow => false,
            SetSwallowOption::Swallow => true,
            SetSwallowOption::Toggle => !current,
        }
    }
}

impl TabLockMode {
    pub fn apply(self, current: bool) -> bool {
        match self {
            TabLockMode::Lock => true,
            TabLockMode::Unlock => false,
            TabLockMode::Toggle => !current,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExpandOption {
    Expand,
    Shrink,
    Base,
    Maximize,
    Fullscreen,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExpandFullscreenOption {
    #[default]
    MaximizeOnly,
    MaximizeIntermediate,
    MaximizeAsFullscreen,
}
