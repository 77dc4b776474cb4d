//! Command-line front end.
//!
//! Each invocation loads what it needs into a fresh [`Workspace`], performs
//! one action through it, and prints plain-text rows. Writes go through
//! the same create-form and edit-buffer paths a UI would use.

use std::io::Write;

use chrono::NaiveDate;

use taskflow_proto::blank::parse_date;
use taskflow_proto::{
    CollectionName, EntityKind, Member, MemberFields, Project, ProjectFields, Task, TaskFields,
    TaskPriority, TaskStatus,
};

use crate::config::CliArgs;
use crate::edit::EditError;
use crate::remote::Remote;
use crate::store::LoadError;
use crate::views::{ActivityRow, MemberRow, MetricsView, ProjectRow, TaskRow};
use crate::workspace::{Entity, Mutation, MutationError, MutationReport, Refresh, Workspace};

/// Top-level parser for the `taskflow` binary.
#[derive(clap::Parser, Debug)]
#[command(version, about = "Task, team, and project tracker client")]
pub struct Cli {
    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: CliArgs,

    /// What to do. Lists tasks when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Task fields settable from the command line.
///
/// On `edit-task`, only the flags given change the buffer. An empty string
/// clears a date or reference.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct TaskFieldArgs {
    /// Longer description.
    #[arg(long)]
    pub description: Option<String>,
    /// Status (Pending, "In Progress", Completed, Blocked).
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Priority (Low, Medium, High, Urgent).
    #[arg(long)]
    pub priority: Option<TaskPriority>,
    /// Due date, `YYYY-MM-DD`.
    #[arg(long)]
    pub due: Option<String>,
    /// Reminder date, `YYYY-MM-DD`.
    #[arg(long)]
    pub reminder: Option<String>,
    /// Assigned member id.
    #[arg(long)]
    pub assignee: Option<String>,
    /// Project id.
    #[arg(long)]
    pub project: Option<String>,
    /// Comments.
    #[arg(long)]
    pub comments: Option<String>,
}

/// Subcommands.
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// List tasks, optionally filtered.
    Tasks {
        /// Only tasks assigned to this member id.
        #[arg(long)]
        assignee: Option<String>,
        /// Only tasks in this project id.
        #[arg(long)]
        project: Option<String>,
        /// Only tasks in this status.
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Only tasks with this priority.
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// Case-insensitive text search over title, description, comments.
        #[arg(long)]
        search: Option<String>,
    },
    /// List team members.
    Members,
    /// List projects.
    Projects,
    /// Show the activity log, newest first.
    Activity,
    /// Show productivity metrics.
    Metrics,
    /// Create a task.
    AddTask {
        /// Task title.
        title: String,
        /// Other fields.
        #[command(flatten)]
        fields: TaskFieldArgs,
    },
    /// Add a team member.
    AddMember {
        /// Display name.
        name: String,
        /// Role on the team.
        role: String,
        /// Contact email.
        email: String,
    },
    /// Create a project.
    AddProject {
        /// Project name.
        name: String,
        /// Longer description.
        #[arg(long)]
        description: Option<String>,
        /// Free-text status (default "Active").
        #[arg(long)]
        status: Option<String>,
    },
    /// Change a task.
    EditTask {
        /// Task id.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// Other fields.
        #[command(flatten)]
        fields: TaskFieldArgs,
    },
    /// Change a team member.
    EditMember {
        /// Member id.
        id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New role.
        #[arg(long)]
        role: Option<String>,
        /// New email.
        #[arg(long)]
        email: Option<String>,
    },
    /// Change a project.
    EditProject {
        /// Project id.
        id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New status.
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete a task.
    DeleteTask {
        /// Task id.
        id: String,
    },
    /// Delete a team member. Tasks keep the dangling assignee id.
    DeleteMember {
        /// Member id.
        id: String,
    },
    /// Delete a project. Tasks keep the dangling project id.
    DeleteProject {
        /// Project id.
        id: String,
    },
}

/// Errors surfaced to the user by a CLI run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A collection could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A write failed or was rejected.
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// The record to edit does not exist.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// A date argument did not parse.
    #[error("invalid date {value:?} (expected YYYY-MM-DD)")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// Writing output failed.
    #[error("writing output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs one command against the workspace, printing to `out`.
///
/// # Errors
///
/// Returns [`CliError`] if a needed load or the write fails, or if an
/// argument is invalid.
pub async fn run<R: Remote>(
    ws: &Workspace<R>,
    command: Command,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::Tasks {
            assignee,
            project,
            status,
            priority,
            search,
        } => {
            let (tasks, members, projects) = tokio::join!(
                ws.load(CollectionName::Tasks),
                ws.load(CollectionName::Members),
                ws.load(CollectionName::Projects),
            );
            loaded(tasks)?;
            // Labels fall back to placeholders if these fail.
            for refresh in [members, projects] {
                if let Err(e) = refresh.outcome {
                    tracing::warn!(collection = %refresh.collection, error = %e, "labels unavailable");
                }
            }
            ws.update_filter(|f| {
                f.set_assignee(assignee.unwrap_or_default());
                f.set_project(project.unwrap_or_default());
                f.set_status(status);
                f.set_priority(priority);
                f.set_search(search.unwrap_or_default());
            });
            let members = ws.store().members.snapshot();
            let projects = ws.store().projects.snapshot();
            let view = ws.filtered_tasks();
            if view.is_empty() {
                writeln!(out, "No tasks.")?;
            }
            for task in &view {
                writeln!(out, "{}", TaskRow::build(task, &members, &projects))?;
            }
        }
        Command::Members => {
            loaded(ws.load(CollectionName::Members).await)?;
            for member in ws.store().members.snapshot().iter() {
                writeln!(out, "{}", MemberRow::from(member))?;
            }
        }
        Command::Projects => {
            loaded(ws.load(CollectionName::Projects).await)?;
            for project in ws.store().projects.snapshot().iter() {
                writeln!(out, "{}", ProjectRow::from(project))?;
            }
        }
        Command::Activity => {
            loaded(ws.load(CollectionName::Activity).await)?;
            for entry in ws.store().activity.snapshot().iter() {
                writeln!(out, "{}", ActivityRow::from(entry))?;
            }
        }
        Command::Metrics => {
            if let Err(e) = ws.refresh_metrics().await {
                tracing::warn!(error = %e, "showing empty metrics");
            }
            write!(out, "{}", MetricsView::from(ws.metrics().as_ref()))?;
        }
        Command::AddTask { title, fields } => {
            let mut form = TaskFields::titled(title);
            fields.apply(&mut form)?;
            ws.set_form::<Task>(form);
            report(out, ws.create::<Task>().await?)?;
        }
        Command::AddMember { name, role, email } => {
            ws.set_form::<Member>(MemberFields::new(name, role, email));
            report(out, ws.create::<Member>().await?)?;
        }
        Command::AddProject {
            name,
            description,
            status,
        } => {
            ws.update_form::<Project>(|p| {
                p.name = name;
                set(&mut p.description, description);
                set(&mut p.status, status);
            });
            report(out, ws.create::<Project>().await?)?;
        }
        Command::EditTask { id, title, fields } => {
            let mut result = Ok(());
            edit::<Task, R>(ws, &id, |b| {
                set(&mut b.title, title);
                result = fields.apply(b);
            })
            .await?;
            result?;
            report(out, ws.submit_edit::<Task>().await?)?;
        }
        Command::EditMember {
            id,
            name,
            role,
            email,
        } => {
            edit::<Member, R>(ws, &id, |b| {
                set(&mut b.name, name);
                set(&mut b.role, role);
                set(&mut b.email, email);
            })
            .await?;
            report(out, ws.submit_edit::<Member>().await?)?;
        }
        Command::EditProject {
            id,
            name,
            description,
            status,
        } => {
            edit::<Project, R>(ws, &id, |b| {
                set(&mut b.name, name);
                set(&mut b.description, description);
                set(&mut b.status, status);
            })
            .await?;
            report(out, ws.submit_edit::<Project>().await?)?;
        }
        Command::DeleteTask { id } => report(out, ws.delete_kind(EntityKind::Task, &id).await?)?,
        Command::DeleteMember { id } => {
            report(out, ws.delete_kind(EntityKind::Member, &id).await?)?;
        }
        Command::DeleteProject { id } => {
            report(out, ws.delete_kind(EntityKind::Project, &id).await?)?;
        }
    }
    Ok(())
}

impl TaskFieldArgs {
    /// Overwrites the fields of `target` that were given.
    fn apply(self, target: &mut TaskFields) -> Result<(), CliError> {
        set(&mut target.description, self.description);
        if let Some(status) = self.status {
            target.status = status;
        }
        if let Some(priority) = self.priority {
            target.priority = priority;
        }
        if let Some(due) = self.due {
            target.due_date = date_arg(&due)?;
        }
        if let Some(reminder) = self.reminder {
            target.reminder_date = date_arg(&reminder)?;
        }
        if let Some(assignee) = self.assignee {
            target.assignee_id = Some(assignee).filter(|s| !s.is_empty());
        }
        if let Some(project) = self.project {
            target.project_id = Some(project).filter(|s| !s.is_empty());
        }
        set(&mut target.comments, self.comments);
        Ok(())
    }
}

fn set(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn date_arg(raw: &str) -> Result<Option<NaiveDate>, CliError> {
    if raw.is_empty() {
        return Ok(None);
    }
    parse_date(raw).map(Some).map_err(|_| CliError::InvalidDate {
        value: raw.to_string(),
    })
}

fn loaded(refresh: Refresh) -> Result<(), CliError> {
    refresh.outcome.map(|_| ()).map_err(CliError::from)
}

/// Loads `E`'s collection and puts `id` into edit mode with `change` applied.
async fn edit<E: Entity, R: Remote>(
    ws: &Workspace<R>,
    id: &str,
    change: impl FnOnce(&mut E::Fields),
) -> Result<(), CliError> {
    loaded(ws.load(E::KIND.collection()).await)?;
    ws.begin_edit::<E>(id)?;
    ws.edit::<E>(change);
    Ok(())
}

fn report(out: &mut impl Write, report: MutationReport) -> Result<(), CliError> {
    let past = match report.mutation {
        Mutation::Create => "Created",
        Mutation::Update => "Updated",
        Mutation::Delete => "Deleted",
    };
    match &report.id {
        Some(id) => writeln!(out, "{past} {} {id}", report.kind)?,
        None => writeln!(out, "{past} {}", report.kind)?,
    }
    if !report.fully_refreshed() {
        writeln!(out, "warning: some views could not be refreshed")?;
    }
    Ok(())
}
