use crate::constants::{
    DEFAULT_PROFILE_AVATAR, DEFAULT_PROFILE_NAME, DEFAULT_TASK_ICON, KEY_PRIZES, KEY_PROFILE,
    KEY_TASKS, SEED_PRIZES, SEED_TASKS,
};
use crate::storage::{encode_json, read_json, KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error("no {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

/// A timed chore that earns stars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub duration_minutes: u32,
    pub reward_stars: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: String,
    pub name: String,
    pub cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boy,
    Girl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub gender: Gender,
    pub avatar: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            gender: Gender::Boy,
            avatar: DEFAULT_PROFILE_AVATAR.to_string(),
        }
    }
}

pub fn default_tasks() -> Vec<Task> {
    SEED_TASKS
        .iter()
        .enumerate()
        .map(|(ii, (name, icon, duration, stars))| Task {
            id: (ii + 1).to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            duration_minutes: *duration,
            reward_stars: *stars,
        })
        .collect()
}

pub fn default_prizes() -> Vec<Prize> {
    SEED_PRIZES
        .iter()
        .enumerate()
        .map(|(ii, (name, cost, icon))| Prize {
            id: (ii + 1).to_string(),
            name: name.to_string(),
            cost: *cost,
            icon: Some(icon.to_string()),
            image_url: None,
        })
        .collect()
}

fn require_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::Invalid {
            field: "name",
            reason: "must not be empty",
        });
    }
    Ok(())
}

fn require_positive(field: &'static str, value: i64) -> Result<(), CatalogError> {
    if value <= 0 {
        return Err(CatalogError::Invalid {
            field,
            reason: "must be positive",
        });
    }
    Ok(())
}

/// Task & prize catalogs plus the child's profile
#[derive(Debug)]
pub struct Catalog<'s, S: KeyValueStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: KeyValueStore + ?Sized> Catalog<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Tasks, seeding & persisting the defaults on first access
    pub fn tasks(&mut self) -> Result<Vec<Task>, CatalogError> {
        if let Some(tasks) = read_json::<Vec<Task>, S>(&*self.store, KEY_TASKS)? {
            return Ok(tasks);
        }
        let tasks = default_tasks();
        self.save_tasks(&tasks)?;
        Ok(tasks)
    }

    pub fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), CatalogError> {
        self.store.set(KEY_TASKS, encode_json(KEY_TASKS, tasks)?)?;
        Ok(())
    }

    pub fn task(&mut self, id: &str) -> Result<Task, CatalogError> {
        self.tasks()?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: "task",
                id: id.to_string(),
            })
    }

    pub fn add_task(
        &mut self,
        name: &str,
        duration_minutes: u32,
        reward_stars: i64,
    ) -> Result<Task, CatalogError> {
        require_name(name)?;
        require_positive("duration", i64::from(duration_minutes))?;
        require_positive("reward", reward_stars)?;
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            icon: DEFAULT_TASK_ICON.to_string(),
            duration_minutes,
            reward_stars,
        };
        let mut tasks = self.tasks()?;
        tasks.push(task.clone());
        self.save_tasks(&tasks)?;
        info!(task_id = %task.id, name = %task.name, "task added");
        Ok(task)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Task, CatalogError> {
        let mut tasks = self.tasks()?;
        let indx = tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: "task",
                id: id.to_string(),
            })?;
        let removed = tasks.remove(indx);
        self.save_tasks(&tasks)?;
        info!(task_id = %removed.id, "task removed");
        Ok(removed)
    }

    /// Prizes, seeding & persisting the defaults on first access
    pub fn prizes(&mut self) -> Result<Vec<Prize>, CatalogError> {
        if let Some(prizes) = read_json::<Vec<Prize>, S>(&*self.store, KEY_PRIZES)? {
            return Ok(prizes);
        }
        let prizes = default_prizes();
        self.save_prizes(&prizes)?;
        Ok(prizes)
    }

    pub fn save_prizes(&mut self, prizes: &[Prize]) -> Result<(), CatalogError> {
        self.store.set(KEY_PRIZES, encode_json(KEY_PRIZES, prizes)?)?;
        Ok(())
    }

    pub fn prize(&mut self, id: &str) -> Result<Prize, CatalogError> {
        self.prizes()?
            .into_iter()
            .find(|prize| prize.id == id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: "prize",
                id: id.to_string(),
            })
    }

    pub fn add_prize(
        &mut self,
        name: &str,
        cost: i64,
        icon: Option<&str>,
    ) -> Result<Prize, CatalogError> {
        require_name(name)?;
        require_positive("cost", cost)?;
        let prize = Prize {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            cost,
            icon: icon.map(str::to_string),
            image_url: None,
        };
        let mut prizes = self.prizes()?;
        prizes.push(prize.clone());
        self.save_prizes(&prizes)?;
        info!(prize_id = %prize.id, name = %prize.name, cost, "prize added");
        Ok(prize)
    }

    /// Removes a prize from the catalog. Requests already filed keep their
    /// snapshot of it
    pub fn remove_prize(&mut self, id: &str) -> Result<Prize, CatalogError> {
        let mut prizes = self.prizes()?;
        let indx = prizes
            .iter()
            .position(|prize| prize.id == id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: "prize",
                id: id.to_string(),
            })?;
        let removed = prizes.remove(indx);
        self.save_prizes(&prizes)?;
        info!(prize_id = %removed.id, "prize removed");
        Ok(removed)
    }

    pub fn profile(&self) -> Result<Profile, CatalogError> {
        Ok(read_json::<Profile, S>(&*self.store, KEY_PROFILE)?.unwrap_or_default())
    }

    pub fn save_profile(&mut self, profile: &Profile) -> Result<(), CatalogError> {
        require_name(&profile.name)?;
        self.store.set(KEY_PROFILE, encode_json(KEY_PROFILE, profile)?)?;
        Ok(())
    }
}
