//! Route activation and route diffs

use tracing::{debug, warn};

use super::NetStateEngine;
use crate::model::{Route, RouteSet};

impl NetStateEngine {
    /// Associate `route` with the interfaces it names and mark it active if
    /// all of them exist and are active
    ///
    /// A missing interface makes the route inactive but does not stop the
    /// association with the other interface. Association with an existing
    /// inactive interface still happens.
    pub(crate) fn activate_route(&mut self, route: &Route) -> bool {
        let mut active = true;
        for id in route.interfaces() {
            match self.registry.get_mut(id) {
                Some(entry) => {
                    entry.routes.insert(route.clone());
                    if !entry.interface.is_active() {
                        active = false;
                    }
                }
                None => {
                    warn!(
                        "Route to {}/{} references unknown interface {}",
                        route.dst, route.dst_prefix_len, id
                    );
                    active = false;
                }
            }
        }
        if active {
            self.indices.insert_route(route);
        }
        active
    }

    /// Deactivate `routes`, returning the ones that were active
    ///
    /// With `detach` set, the routes are also removed from the route sets of
    /// the interfaces they reference.
    pub(crate) fn deactivate_routes(&mut self, routes: RouteSet, detach: bool) -> RouteSet {
        routes
            .into_iter()
            .filter(|route| {
                if detach {
                    for id in route.interfaces() {
                        if let Some(entry) = self.registry.get_mut(id) {
                            entry.routes.remove(route);
                        }
                    }
                }
                self.indices.remove_route(route)
            })
            .collect()
    }

    /// Replace the whole route table with `desired`
    ///
    /// Notifies once with the routes that became active and the routes that
    /// were active before but are not any more.
    pub fn set_routes(&mut self, desired: RouteSet) {
        let mut previous = self.indices.active_routes().clone();
        self.indices.clear_routes();
        for entry in self.registry.iter_mut() {
            entry.routes.clear();
        }

        let added: RouteSet = desired
            .into_iter()
            .filter(|route| {
                let active = self.activate_route(route);
                // Still active: neither added nor removed
                let was_active = active && previous.remove(route);
                active && !was_active
            })
            .collect();

        debug!(
            "set_routes: {} active, {} added, {} removed",
            self.indices.active_routes().len(),
            added.len(),
            previous.len()
        );
        self.notify_routes(&added, &previous);
    }

    /// Add and remove individual routes
    ///
    /// Routes already active, or present in both sets, are skipped on the add
    /// side. Only routes that actually changed state are reported.
    pub fn modify_routes(&mut self, add: RouteSet, remove: RouteSet) {
        let added: RouteSet = add
            .into_iter()
            .filter(|route| {
                if self.indices.is_route_active(route) || remove.contains(route) {
                    return false;
                }
                self.activate_route(route)
            })
            .collect();
        let removed = self.deactivate_routes(remove, true);
        self.notify_routes(&added, &removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interface, InterfaceFlags, InterfaceId};
    use crate::notify::NoopNotifier;

    fn engine_with(ifaces: &[(u32, bool)]) -> NetStateEngine {
        let mut engine = NetStateEngine::new(Box::new(NoopNotifier));
        for &(id, active) in ifaces {
            let flags = if active {
                InterfaceFlags::up_running()
            } else {
                InterfaceFlags::default()
            };
            engine
                .registry
                .upsert(Interface::new(id, format!("if{id}"), flags));
        }
        engine
    }

    fn route(dst: &str, len: u8) -> Route {
        Route::new(dst.parse().unwrap(), len)
    }

    #[test]
    fn test_activate_route_without_interfaces() {
        let mut engine = engine_with(&[]);
        assert!(engine.activate_route(&route("10.0.0.0", 8)));
        assert_eq!(engine.active_routes().len(), 1);
    }

    #[test]
    fn test_activate_route_associates_inactive_interface() {
        let mut engine = engine_with(&[(1, false)]);
        let r = route("10.0.0.0", 8).with_iface_out(1);

        assert!(!engine.activate_route(&r));
        assert!(engine.active_routes().is_empty());
        assert!(engine.interface_routes(InterfaceId(1)).unwrap().contains(&r));
    }

    #[test]
    fn test_activate_route_missing_in_still_associates_out() {
        let mut engine = engine_with(&[(2, true)]);
        let r = route("10.0.0.0", 8).with_iface_in(9).with_iface_out(2);

        assert!(!engine.activate_route(&r));
        assert!(engine.interface_routes(InterfaceId(2)).unwrap().contains(&r));
        assert!(!engine.is_route_active(&r));
    }

    #[test]
    fn test_deactivate_without_detach_keeps_association() {
        let mut engine = engine_with(&[(1, true)]);
        let r = route("0.0.0.0", 0).with_iface_out(1);
        engine.activate_route(&r);

        let removed = engine.deactivate_routes(RouteSet::from([r.clone()]), false);
        assert!(removed.contains(&r));
        assert!(engine.interface_routes(InterfaceId(1)).unwrap().contains(&r));
        assert!(engine.default_routes(InterfaceId(1)).is_none());
    }

    #[test]
    fn test_deactivate_filters_inactive() {
        let mut engine = engine_with(&[(1, false)]);
        let r = route("0.0.0.0", 0).with_iface_out(1);
        engine.activate_route(&r);

        let removed = engine.deactivate_routes(RouteSet::from([r.clone()]), true);
        assert!(removed.is_empty());
        assert!(engine.interface_routes(InterfaceId(1)).unwrap().is_empty());
    }
}
