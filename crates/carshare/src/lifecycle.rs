//! The rental lifecycle manager.
//!
//! Owns every status transition of a rental and the ownership checks gating
//! it. Persistence is reached only through [`RentalStore`], whose mutating
//! methods are conditional on the status the manager last read, so two
//! requests racing on one rental cannot both succeed.
//!
//! Checks run in a fixed order: the rental must exist, the actor must be
//! allowed, the current status must permit the action, and only then are
//! submitted fields validated.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identity::Actor;
use crate::model::{
    Car, CarId, NewCar, Rental, RentalChanges, RentalForm, RentalId, RentalStatus, Transition,
    User, UserId,
};

/// The persistence collaborator used by [`RentalManager`].
///
/// Methods returning `bool` are compare-and-swap updates: they apply only if
/// the row still has the `expected` status and report whether it matched.
pub trait RentalStore {
    /// Look up a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Look up a car.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn car(&self, id: CarId) -> Result<Option<Car>>;

    /// All cars registered by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn cars_owned_by(&self, owner: UserId) -> Result<Vec<Car>>;

    /// Persist an already-validated car.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_car(&self, owner: UserId, car: &NewCar) -> Result<Car>;

    /// Look up a rental.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn rental(&self, id: RentalId) -> Result<Option<Rental>>;

    /// All rentals listed by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn rentals_owned_by(&self, owner: UserId) -> Result<Vec<Rental>>;

    /// All rentals reserved by `renter`, including canceled ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn rentals_rented_by(&self, renter: UserId) -> Result<Vec<Rental>>;

    /// Open listings, soonest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn available_rentals(&self, limit: usize) -> Result<Vec<Rental>>;

    /// Persist a new available rental.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_rental(&self, owner: UserId, form: &RentalForm) -> Result<Rental>;

    /// Replace the editable fields if the status is still `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn update_rental(&self, id: RentalId, expected: RentalStatus, form: &RentalForm)
        -> Result<bool>;

    /// Move from `expected` to `next` if the status is still `expected`.
    ///
    /// A `Some` renter is recorded; `None` leaves the renter untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn transition_rental(
        &self,
        id: RentalId,
        expected: RentalStatus,
        next: RentalStatus,
        renter: Option<UserId>,
    ) -> Result<bool>;

    /// Remove the rental if the status is still `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_rental(&self, id: RentalId, expected: RentalStatus) -> Result<bool>;
}

/// Policy switches for behaviour the lifecycle leaves open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecyclePolicy {
    /// Only canceled rentals may be deleted.
    pub delete_requires_cancel: bool,
    /// Owners may still edit a canceled rental.
    pub allow_edit_after_cancel: bool,
}

/// A user's listings and reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    /// The user the overview is for.
    pub user: User,
    /// Cars the user has registered.
    pub cars: Vec<Car>,
    /// Rentals the user listed.
    pub listings: Vec<Rental>,
    /// Rentals the user reserved.
    pub reservations: Vec<Rental>,
}

/// Enforces the rental state machine and its authorization rules.
#[derive(Debug)]
pub struct RentalManager<'a, S> {
    store: &'a S,
    policy: LifecyclePolicy,
}

impl<'a, S: RentalStore> RentalManager<'a, S> {
    /// Create a manager over `store`.
    #[must_use]
    pub fn new(store: &'a S, policy: LifecyclePolicy) -> Self {
        Self { store, policy }
    }

    /// The policy in effect.
    #[must_use]
    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// Register a car for the acting user.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed fields.
    pub fn register_car(&self, actor: &Actor, car: NewCar) -> Result<Car> {
        let car = car.validated(Local::now().year())?;
        let car = self.store.insert_car(actor.user_id, &car)?;
        info!(car = %car.id, owner = %actor.user_id, plate = %car.license_plate, "Registered car");
        Ok(car)
    }

    /// The cars the acting user can list.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn cars_for(&self, actor: &Actor) -> Result<Vec<Car>> {
        self.store.cars_owned_by(actor.user_id)
    }

    /// List one of the actor's cars as a new available rental.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed fields or a car the actor
    /// does not own.
    pub fn create(&self, actor: &Actor, form: RentalForm) -> Result<Rental> {
        let form = form.validated()?;
        self.owned_car(actor, form.car_id)?;

        let rental = self.store.insert_rental(actor.user_id, &form)?;
        info!(
            rental = %rental.id,
            owner = %actor.user_id,
            car = %rental.car_id,
            price = %rental.price,
            "Listed rental"
        );
        Ok(rental)
    }

    /// Edit the rental's location, time, price, terms or car.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the rental does not exist
    /// - [`Error::Authorization`] if the actor is not the owner
    /// - [`Error::InvalidState`] if the rental is canceled and the policy
    ///   forbids editing it, or its status changed underneath this call
    /// - [`Error::Validation`] for malformed fields
    pub fn update(&self, id: RentalId, actor: &Actor, changes: RentalChanges) -> Result<Rental> {
        self.update_with(id, actor, || Ok(changes))
    }

    /// Like [`update`](Self::update), but the changes are produced by
    /// `changes` only once the rental exists, the actor owns it and its
    /// state allows editing. Raw requests decoded this way cannot turn a
    /// refusal into a validation error.
    ///
    /// # Errors
    ///
    /// As [`update`](Self::update), plus whatever `changes` returns.
    pub fn update_with<F>(&self, id: RentalId, actor: &Actor, changes: F) -> Result<Rental>
    where
        F: FnOnce() -> Result<RentalChanges>,
    {
        const ACTION: &str = "edit";

        let rental = self.load(id)?;
        if !rental.is_owned_by(actor.user_id) {
            return Err(refuse(&rental, actor, ACTION, "only the owner can edit this rental"));
        }
        if rental.status.is_terminal() && !self.policy.allow_edit_after_cancel {
            return Err(invalid_state(&rental, ACTION));
        }

        let form = changes()?.apply_to(&rental).validated()?;
        if form.car_id != rental.car_id {
            self.owned_car(actor, form.car_id)?;
        }

        if !self.store.update_rental(id, rental.status, &form)? {
            return Err(self.conflict(id, ACTION));
        }
        info!(rental = %id, owner = %actor.user_id, "Updated rental");
        self.load(id)
    }

    /// Reserve an available rental for the actor.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the rental does not exist
    /// - [`Error::Authorization`] if the actor owns the rental
    /// - [`Error::InvalidState`] if the rental is not available
    pub fn reserve(&self, id: RentalId, actor: &Actor) -> Result<Rental> {
        let rental = self.load(id)?;
        if rental.is_owned_by(actor.user_id) {
            return Err(refuse(
                &rental,
                actor,
                Transition::Reserve.as_str(),
                "owners cannot rent their own listing",
            ));
        }
        self.transition(&rental, Transition::Reserve, Some(actor.user_id))?;
        info!(rental = %id, renter = %actor.user_id, "Reserved rental");
        self.load(id)
    }

    /// Cancel a rental as its owner or current renter.
    ///
    /// The renter is kept on the record.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the rental does not exist
    /// - [`Error::Authorization`] if the actor is neither owner nor renter
    /// - [`Error::InvalidState`] if the rental is already canceled
    pub fn cancel(&self, id: RentalId, actor: &Actor) -> Result<Rental> {
        let rental = self.load(id)?;
        if !rental.is_owned_by(actor.user_id) && !rental.is_rented_by(actor.user_id) {
            return Err(refuse(
                &rental,
                actor,
                Transition::Cancel.as_str(),
                "only the owner or the renter can cancel this rental",
            ));
        }
        self.transition(&rental, Transition::Cancel, None)?;
        info!(rental = %id, by = %actor.user_id, was = %rental.status, "Canceled rental");
        self.load(id)
    }

    /// Delete a rental as its owner, returning the removed record.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the rental does not exist
    /// - [`Error::Authorization`] if the actor is not the owner
    /// - [`Error::InvalidState`] if the policy requires cancellation first,
    ///   or the status changed underneath this call
    pub fn delete(&self, id: RentalId, actor: &Actor) -> Result<Rental> {
        const ACTION: &str = "delete";

        let rental = self.load(id)?;
        if !rental.is_owned_by(actor.user_id) {
            return Err(refuse(&rental, actor, ACTION, "only the owner can delete this rental"));
        }
        if self.policy.delete_requires_cancel && rental.status != RentalStatus::Canceled {
            return Err(invalid_state(&rental, ACTION));
        }

        if !self.store.delete_rental(id, rental.status)? {
            return Err(self.conflict(id, ACTION));
        }
        info!(rental = %id, owner = %actor.user_id, "Deleted rental");
        Ok(rental)
    }

    /// Fetch a rental.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the rental does not exist.
    pub fn show(&self, id: RentalId) -> Result<Rental> {
        self.load(id)
    }

    /// Open listings, soonest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn browse(&self, limit: usize) -> Result<Vec<Rental>> {
        self.store.available_rentals(limit)
    }

    /// Everything a user has listed or reserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    pub fn overview(&self, user: UserId) -> Result<Overview> {
        let user = self
            .store
            .user(user)?
            .ok_or_else(|| Error::not_found("user", user))?;
        Ok(Overview {
            cars: self.store.cars_owned_by(user.id)?,
            listings: self.store.rentals_owned_by(user.id)?,
            reservations: self.store.rentals_rented_by(user.id)?,
            user,
        })
    }

    fn load(&self, id: RentalId) -> Result<Rental> {
        self.store
            .rental(id)?
            .ok_or_else(|| Error::not_found("rental", id))
    }

    fn owned_car(&self, actor: &Actor, car_id: CarId) -> Result<Car> {
        match self.store.car(car_id)? {
            Some(car) if car.is_owned_by(actor.user_id) => Ok(car),
            Some(_) => Err(Error::validation("car_id", "must be one of your cars")),
            None => Err(Error::validation("car_id", format!("refers to unknown car {car_id}"))),
        }
    }

    fn transition(
        &self,
        rental: &Rental,
        transition: Transition,
        renter: Option<UserId>,
    ) -> Result<RentalStatus> {
        let action = transition.as_str();
        let next = rental
            .status
            .apply(transition)
            .ok_or_else(|| invalid_state(rental, action))?;

        if !self
            .store
            .transition_rental(rental.id, rental.status, next, renter)?
        {
            return Err(self.conflict(rental.id, action));
        }
        Ok(next)
    }

    /// Explain a compare-and-swap that matched no row.
    fn conflict(&self, id: RentalId, action: &'static str) -> Error {
        match self.store.rental(id) {
            Ok(Some(current)) => {
                debug!(rental = %id, status = %current.status, action, "Lost status race");
                invalid_state(&current, action)
            }
            Ok(None) => Error::not_found("rental", id),
            Err(err) => err,
        }
    }
}

fn refuse(rental: &Rental, actor: &Actor, action: &'static str, reason: &str) -> Error {
    debug!(rental = %rental.id, actor = %actor.user_id, action, "Refused rental action");
    Error::authorization(action, reason)
}

fn invalid_state(rental: &Rental, action: &'static str) -> Error {
    debug!(rental = %rental.id, status = %rental.status, action, "Illegal rental transition");
    Error::InvalidState {
        rental: rental.id,
        status: rental.status,
        action,
    }
}
