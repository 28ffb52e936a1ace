//! Event routing
//!
//! Application handlers per object and event name. The native listener for
//! an event is switched on with the first handler and off with the last.
//! Inbound events carry `<property>Changed` notifications, which are
//! validated like any other native write before handlers run.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tether_codec::{Value, Wire, WireMap};
use tether_dom::ObjectId;

use crate::{BridgeResult, Engine};

/// Application callback; a returned value answers the native sender
pub type Handler = Rc<dyn Fn(&mut Engine, &Event) -> Option<Value>>;

/// Registration token returned by [`Engine::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// An inbound native event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub target: ObjectId,
    pub name: String,
    pub params: Value,
}

pub(crate) type Listeners = HashMap<ObjectId, BTreeMap<String, Vec<(HandlerId, Handler)>>>;

impl Engine {
    /// Add a handler for `event` on a live object
    pub fn on(
        &mut self,
        id: &ObjectId,
        event: &str,
        handler: impl Fn(&mut Engine, &Event) -> Option<Value> + 'static,
    ) -> BridgeResult<HandlerId> {
        self.alive(id)?;
        self.next_handler += 1;
        let handler_id = HandlerId(self.next_handler);
        let handlers = self
            .listeners
            .entry(id.clone())
            .or_default()
            .entry(event.to_string())
            .or_default();
        let first = handlers.is_empty();
        handlers.push((handler_id, Rc::new(handler)));
        if first {
            self.enable_listener(id, event, true);
        }
        Ok(handler_id)
    }

    /// Remove a handler; returns false if it was not registered
    pub fn off(&mut self, id: &ObjectId, event: &str, handler: HandlerId) -> BridgeResult<bool> {
        self.alive(id)?;
        let Some(by_event) = self.listeners.get_mut(id) else {
            return Ok(false);
        };
        let Some(handlers) = by_event.get_mut(event) else {
            return Ok(false);
        };
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != handler);
        if handlers.len() == before {
            return Ok(false);
        }
        if handlers.is_empty() {
            by_event.remove(event);
            self.enable_listener(id, event, false);
        }
        Ok(true)
    }

    fn enable_listener(&mut self, id: &ObjectId, event: &str, enabled: bool) {
        if let Some(object) = self.objects.find_mut(id) {
            if enabled {
                object.listeners.insert(event.to_string());
            } else {
                object.listeners.remove(event);
            }
        }
        self.queue.listen(id, event, enabled);
    }

    /// Deliver an inbound event from native
    ///
    /// Events for ids that are no longer alive are dropped. List pull
    /// requests are answered by the engine itself; everything else goes
    /// to the registered handlers, and the first value returned wins.
    pub fn notify(&mut self, id: &ObjectId, event: &str, params: WireMap) -> BridgeResult<Option<Wire>> {
        if !self.objects.contains(id) {
            tracing::debug!("dropping {} for unknown object {}", event, id);
            return Ok(None);
        }
        if let Some(answer) = self.collection_request(id, event, &params)? {
            return Ok(Some(answer));
        }

        if event == "resize" {
            self.mark_parent_dirty(id);
        } else if let Some(property) = event.strip_suffix("Changed") {
            let declared = self.descriptor_of(id)?.get(property).is_some();
            if let (true, Some(value)) = (declared, params.get("value")) {
                if !self.set_from_native(id, property, value)? {
                    return Ok(None);
                }
            }
        }
        Ok(self.dispatch(id, event, params))
    }

    fn dispatch(&mut self, id: &ObjectId, name: &str, params: WireMap) -> Option<Wire> {
        let handlers: Vec<Handler> = self
            .listeners
            .get(id)
            .and_then(|by_event| by_event.get(name))
            .map(|hs| hs.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();
        if handlers.is_empty() {
            return None;
        }

        let event = Event {
            target: id.clone(),
            name: name.to_string(),
            params: Value::from_wire(&Wire::Object(params)),
        };
        let mut result = None;
        for handler in handlers {
            // An earlier handler may have destroyed the target
            if !self.objects.contains(id) {
                break;
            }
            if let Some(value) = handler(self, &event) {
                result.get_or_insert(value);
            }
        }
        result.map(|value| value.to_wire())
    }
}
