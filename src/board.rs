//! Board positions, fields and the authoritative game snapshot.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::gadget::Gadget;
use crate::id::CharacterId;

/// A position on the board. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point {
    /// Creates a point from column and row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance; the board uses 8-neighbourhoods.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={} y={}", self.x, self.y)
    }
}

/// Kind of a board field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldStateEnum {
    /// Bar table holding cocktails.
    BarTable,
    /// Roulette table.
    RouletteTable,
    /// Impassable wall.
    Wall,
    /// Walkable floor.
    #[default]
    Free,
    /// Seat at the bar.
    BarSeat,
    /// Safe that holds a diamond collar or a secret.
    Safe,
    /// Fireplace, where the cat may be caught.
    Fireplace,
}

/// One board field as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Kind of field.
    pub state: FieldStateEnum,

    /// Gadget lying on the field, or a cocktail on a bar table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gadget: Option<Gadget>,

    /// Roulette table destroyed by bang and burn.
    #[serde(default)]
    pub is_destroyed: bool,

    /// Roulette tables only. Hidden from clients; filled in by reconciliation.
    #[serde(default)]
    pub is_inverted: bool,

    /// Chips on a roulette table.
    #[serde(default)]
    pub chip_amount: u32,

    /// Index of a safe, starting at 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_index: Option<u32>,

    /// Covered by fog.
    #[serde(default)]
    pub is_foggy: bool,

    /// Changed since the previous snapshot.
    #[serde(default)]
    pub is_updated: bool,
}

impl Field {
    /// Creates a field of the given kind with default flags.
    #[must_use]
    pub fn new(state: FieldStateEnum) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }
}

/// The board, indexed `[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldMap {
    /// Rows of fields.
    pub map: Vec<Vec<Field>>,
}

impl FieldMap {
    /// Builds a board from a static scenario layout.
    #[must_use]
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let mut safe_index = 0;
        let map = scenario
            .scenario
            .iter()
            .map(|row| {
                row.iter()
                    .map(|state| {
                        let mut field = Field::new(*state);
                        if *state == FieldStateEnum::Safe {
                            safe_index += 1;
                            field.safe_index = Some(safe_index);
                        }
                        field
                    })
                    .collect()
            })
            .collect();
        Self { map }
    }

    /// The field at `p`, if it is on the board.
    #[must_use]
    pub fn get(&self, p: Point) -> Option<&Field> {
        let x = usize::try_from(p.x).ok()?;
        let y = usize::try_from(p.y).ok()?;
        self.map.get(y)?.get(x)
    }

    /// Mutable access to the field at `p`.
    pub fn get_mut(&mut self, p: Point) -> Option<&mut Field> {
        let x = usize::try_from(p.x).ok()?;
        let y = usize::try_from(p.y).ok()?;
        self.map.get_mut(y)?.get_mut(x)
    }

    /// Iterates every field with its position.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn iter(&self) -> impl Iterator<Item = (Point, &Field)> {
        self.map.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, field)| (Point::new(x as i32, y as i32), field))
        })
    }

    /// Number of safes on the board.
    #[must_use]
    pub fn safe_count(&self) -> usize {
        self.iter().filter(|(_, f)| f.state == FieldStateEnum::Safe).count()
    }
}

/// Static level layout delivered with the handshake reply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Rows of field kinds.
    pub scenario: Vec<Vec<FieldStateEnum>>,
}

/// Authoritative game snapshot delivered by each game status message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// Round counter, starting at 1.
    #[serde(default)]
    pub current_round: u32,

    /// The board.
    #[serde(default)]
    pub map: FieldMap,

    /// Safe combinations known to the receiving client.
    #[serde(default)]
    pub my_clue_combinations: BTreeSet<u32>,

    /// Every character on or off the board.
    #[serde(default)]
    pub characters: Vec<Character>,

    /// Position of the white cat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat_coordinates: Option<Point>,

    /// Position of the janitor, once the round limit is reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub janitor_coordinates: Option<Point>,
}

impl State {
    /// The character with `id`.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.character_id == id)
    }

    /// Mutable access to the character with `id`.
    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.character_id == id)
    }

    /// The character standing on `p`, if any.
    #[must_use]
    pub fn character_at(&self, p: Point) -> Option<&Character> {
        self.characters.iter().find(|c| c.coordinates == Some(p))
    }

    /// The field at `p`.
    #[must_use]
    pub fn field(&self, p: Point) -> Option<&Field> {
        self.map.get(p)
    }

    /// Safe index of the field at `p`, if it is a safe.
    #[must_use]
    pub fn safe_index(&self, p: Point) -> Option<u32> {
        self.map
            .get(p)
            .filter(|f| f.state == FieldStateEnum::Safe)
            .and_then(|f| f.safe_index)
    }

    /// Stable digest of the snapshot contents.
    ///
    /// Two snapshots with equal contents always produce equal digests.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        match serde_json::to_vec(self) {
            Ok(bytes) => {
                hasher.update(&bytes);
            }
            Err(_) => {
                hasher.update(format!("{self:?}").as_bytes());
            }
        }
        *hasher.finalize().as_bytes()
    }
}
