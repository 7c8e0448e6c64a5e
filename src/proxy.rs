//! Proxy factory.
//!
//! Stand-ins represent remote objects client-side: a reference string plus
//! one backing slot per declared property, and nothing else. The
//! per-interface slot layout (the "generated type") is built at most once
//! and cached process-wide; stand-in equality is reference-string equality
//! under every path a caller can reach.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock, Mutex, RwLock};

use crate::contract::RpcRoot;
use crate::error::RpcError;
use crate::meta::{InterfaceDef, PropertyDef};
use crate::value::Value;

/// Slot layout of a generated stand-in: every property of the interface
/// and its ancestors, nearest declaration first.
#[derive(Debug)]
pub struct StubShape {
    interface: &'static InterfaceDef,
    properties: Vec<&'static PropertyDef>,
}

impl StubShape {
    fn slot(&self, name: &str) -> Option<(usize, &'static PropertyDef)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
            .map(|(i, p)| (i, *p))
    }
}

/// The generated-type cache: interface identity → shape, append-only.
static SHAPES: LazyLock<Mutex<HashMap<usize, Arc<StubShape>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn shape_for(interface: &'static InterfaceDef) -> Result<Arc<StubShape>, RpcError> {
    if !interface.remote_root() {
        return Err(RpcError::InvalidStub {
            interface: interface.name.to_string(),
        });
    }
    let key = interface as *const InterfaceDef as usize;
    let mut shapes = SHAPES.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(shape) = shapes.get(&key) {
        return Ok(Arc::clone(shape));
    }
    let shape = Arc::new(StubShape {
        interface,
        properties: interface.all_properties(),
    });
    shapes.insert(key, Arc::clone(&shape));
    Ok(shape)
}

/// A generated stand-in for one remote object.
#[derive(Debug)]
pub struct Stub {
    shape: Arc<StubShape>,
    reference: String,
    slots: Vec<RwLock<Value>>,
}

impl Stub {
    pub fn interface(&self) -> &'static InterfaceDef {
        self.shape.interface
    }

    /// Public getter path: reads the backing slot of a readable property.
    pub fn get(&self, name: &str) -> Result<Value, RpcError> {
        match self.shape.slot(name) {
            Some((index, def)) if def.readable => Ok(self.read_slot(index)),
            Some((_, def)) => Err(RpcError::invalid_expression(
                format!("property '{}' has no public getter", def.name),
                self.shape.interface.name,
            )),
            None => Err(RpcError::invalid_expression(
                format!("no property '{}'", name),
                self.shape.interface.name,
            )),
        }
    }

    /// Public setter path: writes the backing slot of a writable property.
    pub fn set(&self, name: &str, value: Value) -> Result<(), RpcError> {
        match self.shape.slot(name) {
            Some((index, def)) if def.writable => {
                self.write_slot(index, value);
                Ok(())
            }
            Some((_, def)) => Err(RpcError::invalid_expression(
                format!("property '{}' has no public setter", def.name),
                self.shape.interface.name,
            )),
            None => Err(RpcError::invalid_expression(
                format!("no property '{}'", name),
                self.shape.interface.name,
            )),
        }
    }

    /// Privileged structural setter: writes any slot regardless of public
    /// setter visibility. Reserved for stub-building helpers.
    pub(crate) fn set_structural(&self, name: &str, value: Value) -> Result<(), RpcError> {
        match self.shape.slot(name) {
            Some((index, _)) => {
                self.write_slot(index, value);
                Ok(())
            }
            None => Err(RpcError::invalid_expression(
                format!("no property '{}'", name),
                self.shape.interface.name,
            )),
        }
    }

    fn read_slot(&self, index: usize) -> Value {
        self.slots[index]
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn write_slot(&self, index: usize, value: Value) {
        *self.slots[index].write().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

impl RpcRoot for Stub {
    fn reference(&self) -> &str {
        &self.reference
    }

    /// Every non-core method of a stand-in fails: remote methods run only
    /// through the call path.
    fn invoke(&self, method: &str, _args: Vec<Value>) -> Result<Value, RpcError> {
        Err(RpcError::CannotCallRemoteMethod {
            method: method.to_string(),
        })
    }

    fn get_member(&self, name: &str) -> Result<Value, RpcError> {
        self.get(name)
    }
}

impl PartialEq for Stub {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Stub {}

impl Hash for Stub {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

/// Stand-in construction.
pub struct Proxy;

impl Proxy {
    /// Build a stand-in for `interface` holding `reference`. The reference
    /// slot is written exactly once, here.
    ///
    /// # Errors
    ///
    /// Construction error if the descriptor does not extend the remote
    /// root contract.
    pub fn stub(
        interface: &'static InterfaceDef,
        reference: impl Into<String>,
    ) -> Result<Arc<Stub>, RpcError> {
        let shape = shape_for(interface)?;
        let slots = (0..shape.properties.len())
            .map(|_| RwLock::new(Value::Null))
            .collect();
        Ok(Arc::new(Stub {
            shape,
            reference: reference.into(),
            slots,
        }))
    }

    /// Build a stand-in with pre-populated property slots, using the
    /// structural setter so setter visibility does not apply. Meant for
    /// reference resolvers that already know some remote state.
    pub fn stub_with(
        interface: &'static InterfaceDef,
        reference: impl Into<String>,
        properties: &[(&str, Value)],
    ) -> Result<Arc<Stub>, RpcError> {
        let stub = Proxy::stub(interface, reference)?;
        for (name, value) in properties {
            stub.set_structural(name, value.clone())?;
        }
        Ok(stub)
    }
}
