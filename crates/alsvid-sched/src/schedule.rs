//! Kernel and program scheduling entry points.

use std::fs;

use tracing::{debug, info, instrument};

use alsvid_ir::{Kernel, Program};

use crate::config::{SchedulerConfig, SchedulerKind};
use crate::error::ScheduleResult;
use crate::platform::Platform;
use crate::resource::{Direction, QubitResources, ResourceManager};
use crate::scheduler::Scheduler;

/// DOT renderings produced alongside a kernel's schedule.
#[derive(Debug, Clone, Default)]
pub struct KernelSchedule {
    /// The dependence graph, ranked by ASAP cycles.
    pub dot: Option<String>,
    /// The graph ranked by the cycles the scheduler actually assigned.
    pub sched_dot: Option<String>,
}

/// Schedule one kernel without resource constraints.
///
/// Dispatches on the configured scheduler (uniform takes precedence over
/// ASAP/ALAP), assigns every gate a cycle, leaves the kernel stably sorted
/// by cycle, and marks it `cycles_valid`.
#[instrument(skip_all, fields(kernel = %kernel.name))]
pub fn schedule_kernel(
    kernel: &mut Kernel,
    platform: &Platform,
    config: &SchedulerConfig,
) -> ScheduleResult<KernelSchedule> {
    info!(
        "{} scheduling kernel '{}'",
        if config.uniform {
            "uniform"
        } else {
            config.scheduler.as_str()
        },
        kernel.name
    );

    let mut sched = Scheduler::new(kernel, platform, config)?;
    let dot = config.print_dot_graphs.then(|| sched.dependence_dot());

    let sched_dot = if config.uniform {
        sched.schedule_alap_uniform()
    } else {
        match config.scheduler {
            SchedulerKind::Asap => sched.schedule_asap(),
            SchedulerKind::Alap => sched.schedule_alap(),
        }
    };

    kernel.cycles_valid = true;
    Ok(KernelSchedule { dot, sched_dot })
}

/// Schedule every kernel of a program without resource constraints.
///
/// Honors the `prescheduler` switch: when disabled, nothing happens and the
/// program is returned untouched. DOT renderings are written into the
/// configured output directory, one dependence graph and one scheduled
/// graph per kernel.
pub fn schedule_program(
    program: &mut Program,
    platform: &Platform,
    config: &SchedulerConfig,
) -> ScheduleResult<()> {
    if !config.prescheduler {
        debug!("prescheduler disabled, skipping program '{}'", program.name);
        return Ok(());
    }

    info!("scheduling program '{}'", program.name);
    for kernel in &mut program.kernels {
        let result = schedule_kernel(kernel, platform, config)?;
        if let Some(dir) = config.output_dir.as_deref() {
            if let Some(dot) = &result.dot {
                let path = dir.join(format!("{}_dependence_graph.dot", kernel.name));
                debug!("writing dependence graph dot to {}", path.display());
                fs::write(path, dot)?;
            }
            if let Some(sched_dot) = &result.sched_dot {
                let suffix = if config.uniform {
                    "UNIFORM".to_string()
                } else {
                    config.scheduler.to_string()
                };
                let path = dir.join(format!("{}{}_scheduled.dot", kernel.name, suffix));
                debug!("writing scheduled dot to {}", path.display());
                fs::write(path, sched_dot)?;
            }
        }
    }
    Ok(())
}

/// Schedule one kernel under resource constraints.
///
/// The scheduling direction follows the configured scheduler: ASAP runs
/// forward, ALAP backward. The resource manager must have been created for
/// the same direction.
#[instrument(skip_all, fields(kernel = %kernel.name))]
pub fn rcschedule_kernel(
    kernel: &mut Kernel,
    platform: &Platform,
    config: &SchedulerConfig,
    rm: &mut dyn ResourceManager,
) -> ScheduleResult<KernelSchedule> {
    info!(
        "{} scheduling kernel '{}' with resource constraints",
        config.scheduler.as_str(),
        kernel.name
    );

    let sched = Scheduler::new(kernel, platform, config)?;
    let sched_dot = match config.scheduler {
        SchedulerKind::Asap => sched.schedule_asap_rc(rm)?,
        SchedulerKind::Alap => sched.schedule_alap_rc(rm)?,
    };

    kernel.cycles_valid = true;
    Ok(KernelSchedule {
        dot: None,
        sched_dot,
    })
}

/// Schedule every non-empty kernel of a program under exclusive qubit
/// occupancy, with a fresh [`QubitResources`] per kernel.
pub fn rcschedule_program(
    program: &mut Program,
    platform: &Platform,
    config: &SchedulerConfig,
) -> ScheduleResult<()> {
    info!("resource-constrained scheduling program '{}'", program.name);
    let direction = match config.scheduler {
        SchedulerKind::Asap => Direction::Forward,
        SchedulerKind::Alap => Direction::Backward,
    };

    for kernel in &mut program.kernels {
        if kernel.is_empty() {
            debug!("kernel '{}' is empty, skipping", kernel.name);
            continue;
        }
        let mut rm = QubitResources::new(platform, direction);
        let result = rcschedule_kernel(kernel, platform, config, &mut rm)?;
        if let (Some(dir), Some(sched_dot)) = (config.output_dir.as_deref(), &result.sched_dot) {
            let path = dir.join(format!("{}_rcschedule.dot", kernel.name));
            debug!("writing scheduled dot to {}", path.display());
            fs::write(path, sched_dot)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::{Gate, QubitId};

    fn bell_kernel(name: &str) -> Kernel {
        let mut k = Kernel::new(name, 2, 0);
        k.push(Gate::generic("h", [QubitId(0)], 1));
        k.push(Gate::cnot(QubitId(0), QubitId(1), 1));
        k
    }

    #[test]
    fn test_schedule_kernel_sets_cycles_valid() {
        let platform = Platform::new(1, 2);
        let mut k = bell_kernel("bell");
        let result = schedule_kernel(&mut k, &platform, &SchedulerConfig::default()).unwrap();
        assert!(k.cycles_valid);
        assert!(result.dot.is_none());
        assert!(result.sched_dot.is_none());
        assert_eq!(k.gates()[0].cycle, 1);
        assert_eq!(k.gates()[1].cycle, 2);
    }

    #[test]
    fn test_schedule_kernel_emits_dots_when_asked() {
        let platform = Platform::new(1, 2);
        let mut k = bell_kernel("bell");
        let config = SchedulerConfig::default().with_dot_output(None);
        let result = schedule_kernel(&mut k, &platform, &config).unwrap();
        assert!(result.dot.unwrap().contains("digraph"));
        assert!(result.sched_dot.unwrap().contains("digraph"));
    }

    #[test]
    fn test_schedule_program_respects_prescheduler_switch() {
        let platform = Platform::new(1, 2);
        let mut program = Program::new("p");
        program.push(bell_kernel("k0"));
        let config = SchedulerConfig::default().with_prescheduler(false);
        schedule_program(&mut program, &platform, &config).unwrap();
        assert!(!program.kernels[0].cycles_valid);
        assert!(!program.kernels[0].gates()[0].is_scheduled());
    }

    #[test]
    fn test_schedule_program_covers_all_kernels() {
        let platform = Platform::new(1, 2);
        let mut program = Program::new("p");
        program.push(bell_kernel("k0"));
        program.push(Kernel::new("empty", 2, 0));
        program.push(bell_kernel("k2"));
        schedule_program(&mut program, &platform, &SchedulerConfig::default()).unwrap();
        assert!(program.kernels.iter().all(|k| k.cycles_valid));
    }

    #[test]
    fn test_rcschedule_program_skips_empty_kernels() {
        let platform = Platform::new(1, 2);
        let mut program = Program::new("p");
        program.push(Kernel::new("empty", 2, 0));
        program.push(bell_kernel("k1"));
        rcschedule_program(&mut program, &platform, &SchedulerConfig::default()).unwrap();
        assert!(!program.kernels[0].cycles_valid);
        assert!(program.kernels[1].cycles_valid);
        assert_eq!(program.kernels[1].gates()[0].cycle, 1);
    }

    #[test]
    fn test_uniform_option_takes_precedence() {
        let platform = Platform::new(1, 2);
        let mut k = bell_kernel("bell");
        let config = SchedulerConfig::default().with_uniform(true);
        schedule_kernel(&mut k, &platform, &config).unwrap();
        assert!(k.cycles_valid);
        assert_eq!(k.depth(1), 3);
    }
}
