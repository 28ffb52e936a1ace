//! Virtualized lists
//!
//! A CollectionView only materializes the cells native asks for. Native
//! pulls through three events: `requestInfo` (cell type of an index),
//! `createCell` (a new pooled cell of a type) and `updateCell` (bind a
//! pooled cell to an index). Cells belong to their list: the application
//! can neither destroy nor re-parent them.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::json;
use tether_codec::{Value, Wire, WireMap};
use tether_dom::{ObjectId, ObjectLookup};

use crate::types::COLLECTION_VIEW;
use crate::{BridgeError, BridgeResult, Engine};

type CellTypeFn = Rc<dyn Fn(usize) -> String>;
type CreateCellFn = Rc<dyn Fn(&mut Engine, &str) -> BridgeResult<ObjectId>>;
type UpdateCellFn = Rc<dyn Fn(&mut Engine, &ObjectId, usize)>;

/// Application callbacks backing a CollectionView
#[derive(Clone)]
pub struct CellAdapter {
    cell_type: CellTypeFn,
    create_cell: CreateCellFn,
    update_cell: UpdateCellFn,
}

impl fmt::Debug for CellAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellAdapter").finish_non_exhaustive()
    }
}

impl CellAdapter {
    /// All items share one cell type unless [`CellAdapter::cell_type`] is set
    pub fn new(
        create_cell: impl Fn(&mut Engine, &str) -> BridgeResult<ObjectId> + 'static,
        update_cell: impl Fn(&mut Engine, &ObjectId, usize) + 'static,
    ) -> Self {
        Self {
            cell_type: Rc::new(|_| String::new()),
            create_cell: Rc::new(create_cell),
            update_cell: Rc::new(update_cell),
        }
    }

    pub fn cell_type(mut self, f: impl Fn(usize) -> String + 'static) -> Self {
        self.cell_type = Rc::new(f);
        self
    }
}

/// Engine-side state of one list
#[derive(Debug)]
pub(crate) struct Collection {
    adapter: CellAdapter,
    pub(crate) reload_pending: bool,
    /// Cell type names; native refers to them by position
    cell_types: Vec<String>,
    cells: Vec<ObjectId>,
    bindings: HashMap<ObjectId, usize>,
}

impl Collection {
    fn new(adapter: CellAdapter) -> Self {
        Self {
            adapter,
            reload_pending: true,
            cell_types: Vec::new(),
            cells: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    fn encode_cell_type(&mut self, name: &str) -> usize {
        match self.cell_types.iter().position(|t| t == name) {
            Some(index) => index,
            None => {
                self.cell_types.push(name.to_string());
                self.cell_types.len() - 1
            }
        }
    }

    fn decode_cell_type(&self, index: usize) -> Option<&str> {
        self.cell_types.get(index).map(String::as_str)
    }

    pub(crate) fn forget(&mut self, cell: &ObjectId) {
        self.cells.retain(|c| c != cell);
        self.bindings.remove(cell);
    }
}

fn range_params(index: usize, count: usize) -> WireMap {
    let mut params = WireMap::new();
    params.insert("index".to_string(), Wire::from(index));
    params.insert("count".to_string(), Wire::from(count));
    params
}

impl Engine {
    /// Create a CollectionView driven by `adapter`
    ///
    /// The first flush loads the initial item count.
    pub fn create_collection(&mut self, adapter: CellAdapter, properties: &[(&str, Value)]) -> BridgeResult<ObjectId> {
        let id = self.create(COLLECTION_VIEW, properties)?;
        for event in ["requestInfo", "createCell", "updateCell"] {
            self.queue.listen(&id, event, true);
        }
        self.collections.insert(id.clone(), Collection::new(adapter));
        Ok(id)
    }

    fn collection(&self, id: &ObjectId) -> BridgeResult<&Collection> {
        self.alive(id)?;
        self.collections.get(id).ok_or_else(|| BridgeError::WrongType {
            id: id.clone(),
            expected: COLLECTION_VIEW,
        })
    }

    pub fn item_count(&self, id: &ObjectId) -> BridgeResult<usize> {
        self.collection(id)?;
        Ok(self
            .objects
            .find(id)
            .and_then(|o| o.properties.get("itemCount"))
            .and_then(Wire::as_u64)
            .unwrap_or(0) as usize)
    }

    /// Replace the item count; native reloads once per flush
    pub fn set_item_count(&mut self, id: &ObjectId, count: usize) -> BridgeResult<()> {
        self.collection(id)?;
        self.set(id, "itemCount", count)
    }

    /// Insert `count` items at `index` without a full reload
    pub fn insert_items(&mut self, id: &ObjectId, index: usize, count: usize) -> BridgeResult<()> {
        let item_count = self.item_count(id)?;
        if count == 0 {
            return Err(BridgeError::EmptyRange);
        }
        if index > item_count {
            return Err(BridgeError::OutOfRange { index, count: item_count });
        }
        self.store(id, "itemCount", Wire::from(item_count + count));
        self.queue.call(id, "insert", range_params(index, count));
        Ok(())
    }

    /// Remove `count` items starting at `index` without a full reload
    pub fn remove_items(&mut self, id: &ObjectId, index: usize, count: usize) -> BridgeResult<()> {
        let item_count = self.item_count(id)?;
        if count == 0 {
            return Err(BridgeError::EmptyRange);
        }
        match index.checked_add(count) {
            Some(end) if end <= item_count => {}
            _ => return Err(BridgeError::OutOfRange { index, count: item_count }),
        }
        self.store(id, "itemCount", Wire::from(item_count - count));
        self.queue.call(id, "remove", range_params(index, count));
        Ok(())
    }

    /// Re-request visible cells, all of them or a single index
    pub fn refresh(&mut self, id: &ObjectId, index: Option<usize>) -> BridgeResult<()> {
        let item_count = self.item_count(id)?;
        let mut params = WireMap::new();
        if let Some(index) = index {
            if index >= item_count {
                return Err(BridgeError::OutOfRange { index, count: item_count });
            }
            params.insert("index".to_string(), Wire::from(index));
        }
        self.queue.call(id, "refresh", params);
        Ok(())
    }

    /// Scroll until `index` is visible
    pub fn reveal(&mut self, id: &ObjectId, index: usize) -> BridgeResult<()> {
        let item_count = self.item_count(id)?;
        if index >= item_count {
            return Err(BridgeError::OutOfRange { index, count: item_count });
        }
        let mut params = WireMap::new();
        params.insert("index".to_string(), Wire::from(index));
        self.queue.call(id, "reveal", params);
        Ok(())
    }

    /// Pooled cells of a list in creation order
    pub fn cells(&self, id: &ObjectId) -> BridgeResult<Vec<ObjectId>> {
        Ok(self.collection(id)?.cells.clone())
    }

    /// Item index a cell was last bound to
    pub fn cell_index(&self, cell: &ObjectId) -> Option<usize> {
        let owner = self.cells.get(cell)?;
        self.collections.get(owner)?.bindings.get(cell).copied()
    }

    pub(crate) fn flush_collections(&mut self) {
        for (id, collection) in self.collections.iter_mut() {
            if !std::mem::take(&mut collection.reload_pending) {
                continue;
            }
            let count = self
                .objects
                .find(id)
                .and_then(|o| o.properties.get("itemCount"))
                .cloned()
                .unwrap_or_else(|| Wire::from(0));
            let mut params = WireMap::new();
            params.insert("itemCount".to_string(), count);
            self.queue.call(id, "load", params);
        }
    }

    /// Answer a native pull request; `None` if `event` is not one
    pub(crate) fn collection_request(
        &mut self,
        id: &ObjectId,
        event: &str,
        params: &WireMap,
    ) -> BridgeResult<Option<Wire>> {
        if !self.collections.contains_key(id) {
            return Ok(None);
        }
        match event {
            "requestInfo" => Ok(Some(self.request_info(id, params))),
            "createCell" => self.create_cell(id, params).map(Some),
            "updateCell" => {
                self.update_cell(id, params);
                Ok(Some(Wire::Null))
            }
            _ => Ok(None),
        }
    }

    fn request_info(&mut self, id: &ObjectId, params: &WireMap) -> Wire {
        let index = params.get("index").and_then(Wire::as_u64).unwrap_or(0) as usize;
        let Some(collection) = self.collections.get_mut(id) else {
            return Wire::Null;
        };
        let name = (collection.adapter.cell_type)(index);
        json!({ "type": collection.encode_cell_type(&name) })
    }

    fn create_cell(&mut self, id: &ObjectId, params: &WireMap) -> BridgeResult<Wire> {
        let Some(collection) = self.collections.get(id) else {
            return Ok(Wire::Null);
        };
        let name = params
            .get("type")
            .and_then(Wire::as_u64)
            .and_then(|index| collection.decode_cell_type(index as usize))
            .map(str::to_string);
        let Some(name) = name else {
            tracing::warn!("Unknown cell type {:?} requested by {}", params.get("type"), id);
            return Ok(Wire::Null);
        };
        let pooled = collection.cells.len();
        if pooled >= self.config.cell_pool_limit {
            tracing::warn!("Cell pool of {} exhausted at {} cells", id, pooled);
            return Ok(Wire::Null);
        }
        let create = Rc::clone(&collection.adapter.create_cell);

        let cell = match create(self, &name) {
            Ok(cell) => cell,
            Err(err) if self.config.strict_native_writes => return Err(err),
            Err(err) => {
                tracing::warn!("Creating a cell for {} failed: {}", id, err);
                return Ok(Wire::Null);
            }
        };
        if !self.objects.contains(&cell) || self.cells.contains_key(&cell) {
            tracing::warn!("{} cannot be used as a cell of {}", cell, id);
            return Ok(Wire::Null);
        }
        if let Err(err) = self.place(id, &cell, None) {
            tracing::warn!("Cannot add cell {} to {}: {}", cell, id, err);
            return Ok(Wire::Null);
        }
        self.cells.insert(cell.clone(), id.clone());
        if let Some(collection) = self.collections.get_mut(id) {
            collection.cells.push(cell.clone());
        }
        Ok(Wire::from(&cell))
    }

    fn update_cell(&mut self, id: &ObjectId, params: &WireMap) {
        let cell = params
            .get("widget")
            .and_then(Wire::as_str)
            .and_then(|raw| self.objects.lookup(raw));
        let index = params.get("index").and_then(Wire::as_u64).map(|i| i as usize);
        let (Some(cell), Some(index)) = (cell, index) else {
            tracing::warn!("Malformed updateCell for {}", id);
            return;
        };
        if self.cells.get(&cell) != Some(id) {
            tracing::warn!("{} is not a cell of {}", cell, id);
            return;
        }
        let Some(collection) = self.collections.get_mut(id) else {
            return;
        };
        collection.bindings.insert(cell.clone(), index);
        let update = Rc::clone(&collection.adapter.update_cell);
        update(self, &cell, index);
    }
}
