//! Placed elements and the terrain-owned catalogs.
//!
//! Buildings, features, knots and units are created by external factories.
//! The terrain asks the factory whether a placement is valid, and only then
//! builds the element, stamps its id onto every tile of its footprint and
//! records it. Elements refer to their tiles by world coordinate.

use serde::{Deserialize, Serialize};

use crate::ids::{CitizenId, ElementId, SettlementId};
use crate::orientation::Orientation;
use crate::terrain::Terrain;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Building,
    Feature,
    /// Axis-aligned connection between two tiles (roads, walls)
    Knot,
    Unit,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementKind::Building => "Building",
            ElementKind::Feature => "Feature",
            ElementKind::Knot => "Knot",
            ElementKind::Unit => "Unit",
        };
        write!(f, "{}", name)
    }
}

/// Where and how an element is to be placed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Lowest world x of the footprint
    pub x: i32,
    /// Lowest world y of the footprint
    pub y: i32,
    pub size_x: u32,
    pub size_y: u32,
    pub orientation: Option<Orientation>,
    pub health: i32,
    pub owner: Option<SettlementId>,
}

impl Placement {
    /// Single-tile placement.
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            size_x: 1,
            size_y: 1,
            orientation: None,
            health: 100,
            owner: None,
        }
    }

    pub fn sized(mut self, size_x: u32, size_y: u32) -> Self {
        self.size_x = size_x.max(1);
        self.size_y = size_y.max(1);
        self
    }

    pub fn facing(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn owned_by(mut self, owner: SettlementId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self
    }

    /// Straight connection from one tile to another. Diagonal connections
    /// have no orientation; factories are expected to reject them.
    pub fn knot(from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> Self {
        let mut placement = Self::at(from_x.min(to_x), from_y.min(to_y)).sized(
            from_x.abs_diff(to_x).saturating_add(1),
            from_y.abs_diff(to_y).saturating_add(1),
        );
        placement.orientation = Orientation::from_delta(to_x - from_x, to_y - from_y);
        placement
    }

    /// Highest world corner of the footprint, `None` when the footprint is
    /// empty or does not fit in world coordinates.
    pub fn far_corner(&self) -> Option<(i32, i32)> {
        let last_x = i32::try_from(self.size_x.checked_sub(1)?).ok()?;
        let last_y = i32::try_from(self.size_y.checked_sub(1)?).ok()?;
        Some((self.x.checked_add(last_x)?, self.y.checked_add(last_y)?))
    }

    /// World coordinates covered, row by row. Empty when there is no
    /// [`Placement::far_corner`].
    pub fn footprint(&self) -> impl Iterator<Item = (i32, i32)> {
        let (x0, y0) = (self.x, self.y);
        let corner = self.far_corner();
        let (x1, y1) = corner.unwrap_or((x0, y0));
        let rows = if corner.is_some() { y0..=y1 } else { 1..=0 };
        rows.flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub x: i32,
    pub y: i32,
    pub size_x: u32,
    pub size_y: u32,
    pub orientation: Option<Orientation>,
    pub health: i32,
    pub owner: Option<SettlementId>,
}

impl Element {
    pub fn new(id: ElementId, kind: ElementKind, placement: &Placement) -> Self {
        Self {
            id,
            kind,
            x: placement.x,
            y: placement.y,
            size_x: placement.size_x,
            size_y: placement.size_y,
            orientation: placement.orientation,
            health: placement.health,
            owner: placement.owner,
        }
    }
}

/// Validity check and constructor for one concrete kind of element.
pub trait ElementFactory {
    fn kind(&self) -> ElementKind;

    /// Whether `placement` is acceptable on `terrain`.
    fn check(&self, terrain: &Terrain, placement: &Placement) -> bool;

    fn make(&self, id: ElementId, placement: &Placement) -> Element {
        Element::new(id, self.kind(), placement)
    }
}

/// Factory accepting any placement whose footprint is materialized and free.
pub struct FreeGroundFactory {
    pub kind: ElementKind,
}

impl ElementFactory for FreeGroundFactory {
    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn check(&self, terrain: &Terrain, placement: &Placement) -> bool {
        if self.kind == ElementKind::Knot && placement.orientation.is_none() {
            return false;
        }
        placement
            .footprint()
            .all(|(x, y)| terrain.tile(x, y).is_some_and(|t| !t.is_occupied()))
    }
}

impl Terrain {
    fn place(&mut self, factory: &dyn ElementFactory, placement: &Placement) -> Option<Element> {
        if placement.far_corner().is_none() || !factory.check(self, placement) {
            log::debug!("{} rejected at ({}, {})", factory.kind(), placement.x, placement.y);
            return None;
        }
        let id = ElementId(self.next_element_id);
        self.next_element_id += 1;
        let element = factory.make(id, placement);
        for (x, y) in placement.footprint() {
            if let Some(mut tile) = self.tile_mut(x, y) {
                tile.set_element(Some(id));
            }
        }
        Some(element)
    }

    pub fn new_building(&mut self, factory: &dyn ElementFactory, placement: &Placement) -> Option<ElementId> {
        let element = self.place(factory, placement)?;
        let id = element.id;
        self.buildings.push(element);
        Some(id)
    }

    pub fn new_feature(&mut self, factory: &dyn ElementFactory, placement: &Placement) -> Option<ElementId> {
        let element = self.place(factory, placement)?;
        let id = element.id;
        self.features.push(element);
        Some(id)
    }

    /// Knots mark their tiles but are not catalogued.
    pub fn new_knot(&mut self, factory: &dyn ElementFactory, placement: &Placement) -> Option<ElementId> {
        self.place(factory, placement).map(|element| element.id)
    }

    pub fn new_unit(&mut self, factory: &dyn ElementFactory, placement: &Placement) -> Option<ElementId> {
        let element = self.place(factory, placement)?;
        let id = element.id;
        self.units.push(element);
        Some(id)
    }

    pub fn add_citizen(&mut self, citizen: CitizenId) {
        self.citizens.push(citizen);
    }

    pub fn all_buildings(&self) -> &[Element] {
        &self.buildings
    }

    pub fn all_features(&self) -> &[Element] {
        &self.features
    }

    pub fn all_units(&self) -> &[Element] {
        &self.units
    }

    pub fn all_citizens(&self) -> &[CitizenId] {
        &self.citizens
    }
}
