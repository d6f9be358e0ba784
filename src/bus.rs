//! Cross-task plumbing between control tasks and the render actor.
//!
//! The bus is the only shared mutable structure in the engine. It holds:
//! - a bounded FIFO of [`Command`]s (multi-producer, single consumer),
//! - the latest [`EngineStatus`] snapshot published after every tick,
//! - the [`EffectCatalog`] describing registered effects,
//! - the most recent [`FrameRendered`] event.
//!
//! Everything is guarded by `critical-section`, so producers never block on
//! the renderer and the renderer never blocks on producers.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use heapless::{Deque, Vec};

use crate::command::{Command, EnqueueError};
use crate::stats::{FrameRendered, RenderStats};
use crate::zone::{BlendMode, MAX_ZONES, ZoneState};

/// Maximum number of effects whose names are mirrored into the catalog
pub const MAX_CATALOG: usize = 128;

/// Set of registered effect ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectIdSet {
    bits: [u32; 8],
}

impl EffectIdSet {
    pub const fn new() -> Self {
        Self { bits: [0; 8] }
    }

    pub fn insert(&mut self, id: u8) {
        self.bits[usize::from(id >> 5)] |= 1 << (id & 31);
    }

    pub fn remove(&mut self, id: u8) {
        self.bits[usize::from(id >> 5)] &= !(1 << (id & 31));
    }

    pub const fn contains(&self, id: u8) -> bool {
        self.bits[(id >> 5) as usize] & (1 << (id & 31)) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|word| *word == 0)
    }
}

/// Effects and palettes known to the engine, as seen by other tasks
#[derive(Debug, Clone, Default)]
pub struct EffectCatalog {
    /// Ids that can currently be activated
    pub available: EffectIdSet,
    /// Registered effect names
    pub names: Vec<(u8, &'static str), MAX_CATALOG>,
    /// Number of palettes in the engine's palette table
    pub palette_count: u8,
}

impl EffectCatalog {
    pub fn name(&self, id: u8) -> Option<&'static str> {
        self.names
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, name)| *name)
    }
}

/// Engine state snapshot, refreshed after every tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStatus {
    pub current_effect: Option<u8>,
    pub brightness: u8,
    pub speed: u8,
    pub palette: u8,
    pub hue: u8,
    pub transition_active: bool,
    pub zones_enabled: bool,
    pub zone_count: u8,
    pub zones: [ZoneState; MAX_ZONES],
    pub stats: RenderStats,
}

/// Shared channel and snapshot storage for one engine instance
///
/// Usually placed in a `static` so control tasks can hold senders.
pub struct EngineBus<const QUEUE: usize> {
    commands: Mutex<RefCell<Deque<Command, QUEUE>>>,
    status: Mutex<Cell<EngineStatus>>,
    catalog: Mutex<RefCell<EffectCatalog>>,
    last_frame: Mutex<Cell<Option<FrameRendered>>>,
}

impl<const QUEUE: usize> EngineBus<QUEUE> {
    pub const fn new() -> Self {
        Self {
            commands: Mutex::new(RefCell::new(Deque::new())),
            status: Mutex::new(Cell::new(EngineStatus {
                current_effect: None,
                brightness: 0,
                speed: 0,
                palette: 0,
                hue: 0,
                transition_active: false,
                zones_enabled: false,
                zone_count: 0,
                zones: [ZoneState::new(None, 255, 15, BlendMode::Overwrite, false); MAX_ZONES],
                stats: RenderStats::new(),
            })),
            catalog: Mutex::new(RefCell::new(EffectCatalog {
                available: EffectIdSet::new(),
                names: Vec::new(),
                palette_count: 0,
            })),
            last_frame: Mutex::new(Cell::new(None)),
        }
    }

    /// Get a sender handle for this bus.
    ///
    /// Multiple senders can coexist; they share the same queue.
    pub const fn sender(&self) -> CommandSender<'_, QUEUE> {
        CommandSender { bus: self }
    }

    /// Get the receiving end, owned by the render actor.
    pub(crate) const fn receiver(&self) -> CommandReceiver<'_, QUEUE> {
        CommandReceiver { bus: self }
    }

    /// Number of commands waiting to be applied
    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.commands.borrow(cs).borrow().len())
    }

    /// Latest published engine snapshot
    pub fn status(&self) -> EngineStatus {
        critical_section::with(|cs| self.status.borrow(cs).get())
    }

    /// Latest published frame event without consuming it
    pub fn last_frame(&self) -> Option<FrameRendered> {
        critical_section::with(|cs| self.last_frame.borrow(cs).get())
    }

    /// Take the latest frame event, leaving the slot empty until the next tick
    pub fn take_frame(&self) -> Option<FrameRendered> {
        critical_section::with(|cs| self.last_frame.borrow(cs).take())
    }

    pub fn current_effect(&self) -> Option<u8> {
        self.status().current_effect
    }

    pub fn brightness(&self) -> u8 {
        self.status().brightness
    }

    pub fn speed(&self) -> u8 {
        self.status().speed
    }

    /// Number of effects that can be activated
    pub fn effect_count(&self) -> usize {
        critical_section::with(|cs| self.catalog.borrow(cs).borrow().available.len())
    }

    pub fn effect_name(&self, id: u8) -> Option<&'static str> {
        critical_section::with(|cs| self.catalog.borrow(cs).borrow().name(id))
    }

    pub fn is_effect_available(&self, id: u8) -> bool {
        critical_section::with(|cs| self.catalog.borrow(cs).borrow().available.contains(id))
    }

    pub fn is_zone_enabled(&self, zone: u8) -> bool {
        self.zone(zone).is_some_and(|z| z.enabled)
    }

    pub fn zone_effect(&self, zone: u8) -> Option<u8> {
        self.zone(zone).and_then(|z| z.effect)
    }

    pub fn zone_brightness(&self, zone: u8) -> Option<u8> {
        self.zone(zone).map(|z| z.brightness)
    }

    pub fn zone_speed(&self, zone: u8) -> Option<u8> {
        self.zone(zone).map(|z| z.speed)
    }

    pub fn zone_palette(&self, zone: u8) -> Option<u8> {
        self.zone(zone).map(|z| z.palette)
    }

    pub fn zone_blend_mode(&self, zone: u8) -> Option<BlendMode> {
        self.zone(zone).map(|z| z.blend_mode)
    }

    fn zone(&self, zone: u8) -> Option<ZoneState> {
        let status = self.status();
        if zone >= status.zone_count {
            return None;
        }
        status.zones.get(usize::from(zone)).copied()
    }

    pub(crate) fn publish_status(&self, status: EngineStatus) {
        critical_section::with(|cs| self.status.borrow(cs).set(status));
    }

    pub(crate) fn publish_frame(&self, frame: FrameRendered) {
        critical_section::with(|cs| self.last_frame.borrow(cs).set(Some(frame)));
    }

    pub(crate) fn publish_catalog(&self, catalog: EffectCatalog) {
        critical_section::with(|cs| *self.catalog.borrow(cs).borrow_mut() = catalog);
    }

    /// Reject commands that reference unknown effects or carry bad values
    fn validate(&self, command: &Command) -> Result<(), EnqueueError> {
        critical_section::with(|cs| {
            let catalog = self.catalog.borrow(cs).borrow();
            let effect_known = |id: u8| {
                if catalog.available.contains(id) {
                    Ok(())
                } else {
                    Err(EnqueueError::InvalidEffect(id))
                }
            };
            let zone_known = |zone: u8| {
                if usize::from(zone) < MAX_ZONES {
                    Ok(())
                } else {
                    Err(EnqueueError::InvalidValue)
                }
            };
            match command {
                Command::SetEffect(id) => effect_known(*id),
                Command::StartTransition { effect, .. } => effect_known(*effect),
                Command::SetSpeed(value) => {
                    if (1..=100).contains(value) {
                        Ok(())
                    } else {
                        Err(EnqueueError::InvalidValue)
                    }
                }
                Command::SetPalette(id) => {
                    if *id < catalog.palette_count {
                        Ok(())
                    } else {
                        Err(EnqueueError::InvalidValue)
                    }
                }
                Command::SetParameter {
                    effect_id, value, ..
                } => {
                    if catalog.name(*effect_id).is_none() {
                        return Err(EnqueueError::InvalidEffect(*effect_id));
                    }
                    if value.is_finite() {
                        Ok(())
                    } else {
                        Err(EnqueueError::InvalidValue)
                    }
                }
                Command::SetZoneEffect { zone, effect } => {
                    zone_known(*zone)?;
                    effect_known(*effect)
                }
                Command::SetZonePalette { zone, palette } => {
                    zone_known(*zone)?;
                    if *palette <= catalog.palette_count {
                        Ok(())
                    } else {
                        Err(EnqueueError::InvalidValue)
                    }
                }
                Command::SetZoneBrightness { zone, .. }
                | Command::SetZoneSpeed { zone, .. }
                | Command::SetZoneBlendMode { zone, .. }
                | Command::SetZoneEnabled { zone, .. } => zone_known(*zone),
                _ => Ok(()),
            }
        })
    }

    fn push(&self, command: Command) -> Result<(), EnqueueError> {
        critical_section::with(|cs| {
            let mut queue = self.commands.borrow(cs).borrow_mut();
            queue.push_back(command).map_err(|_| EnqueueError::QueueFull)
        })
    }

    fn pop(&self) -> Option<Command> {
        critical_section::with(|cs| self.commands.borrow(cs).borrow_mut().pop_front())
    }
}

impl<const QUEUE: usize> Default for EngineBus<QUEUE> {
    fn default() -> Self {
        Self::new()
    }
}

/// A sender handle for an [`EngineBus`].
///
/// This is a lightweight reference that can be copied between tasks.
#[derive(Clone, Copy)]
pub struct CommandSender<'a, const QUEUE: usize> {
    bus: &'a EngineBus<QUEUE>,
}

impl<const QUEUE: usize> CommandSender<'_, QUEUE> {
    /// Validate and queue a command without blocking.
    ///
    /// On error nothing is queued and the queue contents are unchanged.
    pub fn enqueue(&self, command: Command) -> Result<(), EnqueueError> {
        self.bus.validate(&command)?;
        self.bus.push(command)
    }

    /// Access the bus for queries
    pub const fn bus(&self) -> &EngineBus<QUEUE> {
        self.bus
    }
}

/// The consuming end of the command queue
#[derive(Clone, Copy)]
pub(crate) struct CommandReceiver<'a, const QUEUE: usize> {
    bus: &'a EngineBus<QUEUE>,
}

impl<'a, const QUEUE: usize> CommandReceiver<'a, QUEUE> {
    pub(crate) fn try_receive(&self) -> Option<Command> {
        self.bus.pop()
    }

    pub(crate) const fn bus(&self) -> &'a EngineBus<QUEUE> {
        self.bus
    }
}
