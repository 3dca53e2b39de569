//! `Character`: a body plus the dispatcher that drives it.

use npc_core::{CharacterId, Contact, Frame};
use npc_dispatch::{Dispatcher, Gesture, Permission, UnitKind};

use crate::{Body, CharacterSnapshot};

/// One simulated character.
///
/// The phase methods are what the host loop calls each tick; they can also
/// be driven by hand from tests or another engine.
pub struct Character<K: UnitKind> {
    pub body:       Body,
    pub dispatcher: Dispatcher<K, Body>,
    gestures:       Vec<Gesture>,
    contacts:       Vec<Contact>,
}

impl<K: UnitKind> Character<K> {
    pub fn new(body: Body, dispatcher: Dispatcher<K, Body>) -> Self {
        Self { body, dispatcher, gestures: Vec::new(), contacts: Vec::new() }
    }

    #[inline]
    pub fn id(&self) -> CharacterId {
        self.body.id()
    }

    /// Activate the default unit.
    pub fn start(&mut self) {
        self.dispatcher.start(&mut self.body);
    }

    pub fn set_task(&mut self, kind: K, outcome: Option<bool>) {
        self.dispatcher.set_task(kind, outcome, &mut self.body);
    }

    pub fn request_permission(&self, permission: Permission) -> bool {
        self.dispatcher.request_permission(permission)
    }

    /// Deliver `gesture` during the next update phase.
    pub fn queue_gesture(&mut self, gesture: Gesture) {
        self.gestures.push(gesture);
    }

    /// Deliver `contact` during the current (or next) fixed phase.
    pub fn queue_contact(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    // ── Phases ────────────────────────────────────────────────────────────

    /// Walk and turn, then the dispatcher's fixed phase.
    pub fn fixed_update(&mut self, frame: Frame) {
        self.body.locomote(frame.dt);
        self.dispatcher.fixed_update(&mut self.body, frame);
    }

    /// Hand queued contacts to the dispatcher.  When the current unit does
    /// not refuse [`Permission::RootRotation`], a still character also turns
    /// toward whatever bumped it.  Returns how many were delivered.
    pub fn deliver_contacts(&mut self) -> usize {
        let contacts = std::mem::take(&mut self.contacts);
        for contact in &contacts {
            self.dispatcher.contact(&mut self.body, contact);
            if !self.body.is_moving() && self.dispatcher.request_permission(Permission::RootRotation) {
                self.body.face_toward(contact.point);
            }
        }
        contacts.len()
    }

    /// Queued gestures, then the dispatcher's update and scheduler pass.
    /// Returns how many gestures were handled.
    pub fn update(&mut self, frame: Frame) -> usize {
        let mut handled = 0;
        for gesture in std::mem::take(&mut self.gestures) {
            if self.dispatcher.gesture(&gesture, &mut self.body) {
                handled += 1;
            }
        }
        self.dispatcher.update(&mut self.body, frame);
        handled
    }

    /// Finish animation blends, report any change, then the late phase.
    pub fn late_update(&mut self, frame: Frame) {
        if let Some((old, new)) = self.body.animator.step() {
            self.dispatcher.animation_changed(&mut self.body, old, new);
        }
        self.dispatcher.late_update(&mut self.body, frame);
    }

    // ── Observation ───────────────────────────────────────────────────────

    #[inline]
    pub fn is_busy(&self) -> bool {
        !self.dispatcher.scheduler().is_idle()
    }

    pub fn snapshot(&self) -> CharacterSnapshot {
        let sched = self.dispatcher.scheduler();
        CharacterSnapshot {
            id:        self.id(),
            position:  self.body.position,
            facing:    self.body.facing,
            unit:      self.dispatcher.current().map(|k| format!("{k:?}")).unwrap_or_default(),
            root:      sched.front().map(|r| sched.tree().name(r).to_owned()),
            animation: self.body.animator.current(),
            moving:    self.body.is_moving(),
            holding:   self.body.held(),
        }
    }
}

impl<K: UnitKind> std::fmt::Debug for Character<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Character")
            .field("body", &self.body)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
