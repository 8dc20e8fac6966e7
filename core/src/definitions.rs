//! Static tile and map definition tables loaded from TOML documents.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest map edge that fits both nests and a border ring.
const MIN_MAP_EDGE: u32 = 9;

/// Index of a definition within a [`TileDefinitionTable`].
///
/// Identifiers are only minted by the table, so every identifier stays valid
/// for the lifetime of the table that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileDefId(u32);

impl TileDefId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    fn slot(self) -> usize {
        self.0 as usize
    }
}

/// RGBA tint applied to a tile sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Tint {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel.
    pub alpha: u8,
}

impl Tint {
    /// Untinted white.
    pub const WHITE: Tint = Tint::new(255, 255, 255, 255);

    /// Creates a tint from byte channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 4]> for Tint {
    fn from([red, green, blue, alpha]: [u8; 4]) -> Self {
        Self::new(red, green, blue, alpha)
    }
}

impl From<Tint> for [u8; 4] {
    fn from(tint: Tint) -> Self {
        [tint.red, tint.green, tint.blue, tint.alpha]
    }
}

/// Immutable template shared by every tile of one type.
#[derive(Clone, Debug, PartialEq)]
pub struct TileDefinition {
    /// Unique name used by map definitions.
    pub name: String,
    /// Column and row of the sprite within the terrain sheet.
    pub sprite_coords: [u32; 2],
    /// Tint multiplied into the sprite.
    pub tint: Tint,
    /// Blocks movement, projectiles and sight.
    pub solid: bool,
    /// Blocks movement of entities that cannot swim.
    pub water: bool,
    /// Hit points a tile starts with.
    pub health: i32,
    /// Definition the tile turns into when its health runs out.
    pub destroyed_into: Option<TileDefId>,
}

#[derive(Deserialize)]
struct TileDocument {
    #[serde(rename = "tile", default)]
    tiles: Vec<TileRecord>,
}

#[derive(Deserialize)]
struct TileRecord {
    name: String,
    #[serde(default)]
    sprite: [u32; 2],
    #[serde(default)]
    tint: Tint,
    #[serde(default)]
    solid: bool,
    #[serde(default)]
    water: bool,
    #[serde(default)]
    health: i32,
    #[serde(default)]
    destroyed_into: Option<String>,
}

/// Name-indexed collection of [`TileDefinition`] values.
#[derive(Clone, Debug, Default)]
pub struct TileDefinitionTable {
    definitions: Vec<TileDefinition>,
    by_name: HashMap<String, TileDefId>,
}

impl TileDefinitionTable {
    /// Parses a document of `[[tile]]` records.
    ///
    /// Replacement names are resolved eagerly, so a table that loads never
    /// references an unknown definition.
    pub fn from_toml_str(source: &str) -> Result<Self, DefinitionError> {
        let document: TileDocument = toml::from_str(source)?;

        let mut by_name = HashMap::with_capacity(document.tiles.len());
        for (slot, record) in document.tiles.iter().enumerate() {
            let id = TileDefId(slot as u32);
            if by_name.insert(record.name.clone(), id).is_some() {
                return Err(DefinitionError::DuplicateTile {
                    name: record.name.clone(),
                });
            }
        }

        let mut definitions = Vec::with_capacity(document.tiles.len());
        for record in document.tiles {
            let destroyed_into = match record.destroyed_into {
                Some(name) => Some(lookup(&by_name, &name)?),
                None => None,
            };
            definitions.push(TileDefinition {
                name: record.name,
                sprite_coords: record.sprite,
                tint: record.tint,
                solid: record.solid,
                water: record.water,
                health: record.health,
                destroyed_into,
            });
        }

        Ok(Self {
            definitions,
            by_name,
        })
    }

    /// Resolves a definition name into its identifier.
    pub fn id(&self, name: &str) -> Result<TileDefId, DefinitionError> {
        lookup(&self.by_name, name)
    }

    /// Looks up a definition by identifier.
    #[must_use]
    pub fn get(&self, id: TileDefId) -> Option<&TileDefinition> {
        self.definitions.get(id.slot())
    }

    /// Looks up a definition by name.
    pub fn by_name(&self, name: &str) -> Result<&TileDefinition, DefinitionError> {
        let id = self.id(name)?;
        self.get(id).ok_or_else(|| DefinitionError::UnknownTile {
            name: name.to_owned(),
        })
    }

    /// Number of definitions in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Reports whether the table holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates definitions alongside their identifiers.
    pub fn iter(&self) -> impl Iterator<Item = (TileDefId, &TileDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(slot, definition)| (TileDefId(slot as u32), definition))
    }
}

fn lookup(by_name: &HashMap<String, TileDefId>, name: &str) -> Result<TileDefId, DefinitionError> {
    by_name
        .get(name)
        .copied()
        .ok_or_else(|| DefinitionError::UnknownTile {
            name: name.to_owned(),
        })
}

/// Randomised tile-painting walk carved during map generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WormSpec {
    /// Tile painted along the walk.
    pub tile: TileDefId,
    /// Number of walks to carve.
    pub count: u32,
    /// Upper bound on the number of tiles painted by one walk.
    pub max_length: u32,
}

/// Number of enemies of each kind placed when a map starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyCounts {
    /// Stationary turrets.
    pub scorpio: u32,
    /// Patrolling tanks.
    pub leo: u32,
    /// Shielded patrolling tanks.
    pub aries: u32,
}

/// Layout recipe for one map.
#[derive(Clone, Debug, PartialEq)]
pub struct MapDefinition {
    /// Unique name of the map.
    pub name: String,
    /// Number of tile columns.
    pub width: u32,
    /// Number of tile rows.
    pub height: u32,
    /// Tile painted over the whole interior before anything else.
    pub fill: TileDefId,
    /// Tile painted on the border ring.
    pub edge: TileDefId,
    /// Walks carved after the fill.
    pub worms: Vec<WormSpec>,
    /// Floor of the start nest.
    pub start_floor: TileDefId,
    /// Bunker walls sheltering the start nest.
    pub start_bunker: TileDefId,
    /// Floor of the end nest.
    pub end_floor: TileDefId,
    /// Bunker walls sheltering the end nest.
    pub end_bunker: TileDefId,
    /// Marker tile where the player starts.
    pub start_tile: TileDefId,
    /// Marker tile the player must reach.
    pub end_tile: TileDefId,
    /// Enemies placed when the map starts.
    pub enemies: EnemyCounts,
}

#[derive(Deserialize)]
struct MapDocument {
    #[serde(rename = "map", default)]
    maps: Vec<MapRecord>,
}

#[derive(Deserialize)]
struct MapRecord {
    name: String,
    width: u32,
    height: u32,
    fill: String,
    edge: String,
    #[serde(rename = "worm", default)]
    worms: Vec<WormRecord>,
    start_floor: String,
    start_bunker: String,
    end_floor: String,
    #[serde(default)]
    end_bunker: Option<String>,
    start_tile: String,
    end_tile: String,
    #[serde(default)]
    enemies: EnemyCounts,
}

#[derive(Deserialize)]
struct WormRecord {
    tile: String,
    count: u32,
    max_length: u32,
}

/// Name-indexed collection of [`MapDefinition`] values.
#[derive(Clone, Debug, Default)]
pub struct MapDefinitionTable {
    maps: Vec<MapDefinition>,
}

impl MapDefinitionTable {
    /// Parses a document of `[[map]]` records against a tile table.
    pub fn from_toml_str(source: &str, tiles: &TileDefinitionTable) -> Result<Self, DefinitionError> {
        let document: MapDocument = toml::from_str(source)?;
        let mut maps: Vec<MapDefinition> = Vec::with_capacity(document.maps.len());

        for record in document.maps {
            if maps.iter().any(|existing| existing.name == record.name) {
                return Err(DefinitionError::DuplicateMap { name: record.name });
            }
            if record.width < MIN_MAP_EDGE || record.height < MIN_MAP_EDGE {
                return Err(DefinitionError::InvalidDimensions {
                    name: record.name,
                    width: record.width,
                    height: record.height,
                });
            }

            let worms = record
                .worms
                .iter()
                .map(|worm| {
                    Ok(WormSpec {
                        tile: tiles.id(&worm.tile)?,
                        count: worm.count,
                        max_length: worm.max_length,
                    })
                })
                .collect::<Result<Vec<_>, DefinitionError>>()?;

            let start_bunker = tiles.id(&record.start_bunker)?;
            let end_bunker = match &record.end_bunker {
                Some(name) => tiles.id(name)?,
                None => start_bunker,
            };

            maps.push(MapDefinition {
                fill: tiles.id(&record.fill)?,
                edge: tiles.id(&record.edge)?,
                worms,
                start_floor: tiles.id(&record.start_floor)?,
                start_bunker,
                end_floor: tiles.id(&record.end_floor)?,
                end_bunker,
                start_tile: tiles.id(&record.start_tile)?,
                end_tile: tiles.id(&record.end_tile)?,
                enemies: record.enemies,
                name: record.name,
                width: record.width,
                height: record.height,
            });
        }

        Ok(Self { maps })
    }

    /// Looks up a map by name.
    pub fn get(&self, name: &str) -> Result<&MapDefinition, DefinitionError> {
        self.maps
            .iter()
            .find(|map| map.name == name)
            .ok_or_else(|| DefinitionError::UnknownMap {
                name: name.to_owned(),
            })
    }

    /// Maps in document order.
    #[must_use]
    pub fn maps(&self) -> &[MapDefinition] {
        &self.maps
    }
}

/// Failures raised while loading or querying definition tables.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The document is not valid TOML or has mistyped keys.
    #[error("failed to parse definitions: {0}")]
    Parse(#[from] toml::de::Error),
    /// A tile name does not appear in the tile table.
    #[error("unknown tile definition `{name}`")]
    UnknownTile {
        /// Name that failed to resolve.
        name: String,
    },
    /// A map name does not appear in the map table.
    #[error("unknown map definition `{name}`")]
    UnknownMap {
        /// Name that failed to resolve.
        name: String,
    },
    /// Two tile records share a name.
    #[error("tile definition `{name}` is declared more than once")]
    DuplicateTile {
        /// Repeated name.
        name: String,
    },
    /// Two map records share a name.
    #[error("map definition `{name}` is declared more than once")]
    DuplicateMap {
        /// Repeated name.
        name: String,
    },
    /// A map is too small to hold its nests.
    #[error("map `{name}` is {width}x{height}; both edges must be at least 9 tiles")]
    InvalidDimensions {
        /// Map that failed validation.
        name: String,
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },
}
