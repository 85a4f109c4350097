//! Depth-first placement with an explicit worklist
//!
//! Each frame is a package whose visit is in progress (`AddPending`) together
//! with the gating edges still to follow. A package is appended to the
//! sequence when its frame runs out of edges, so everything it must follow is
//! already placed.
//!
//! Running into an in-progress package over a hard edge closes a cycle. If a
//! soft edge lies on that cycle, the part of the stack above it is abandoned
//! and the traversal goes on without it; otherwise the closing edge is
//! recorded, the cycle members get `Loop`, and nothing on the stack is placed.

use super::error::OrderError;
use super::flags::Flags;
use super::list::OrderList;
use super::loops::LoopEdge;
use super::policy::{strongest, Context, Mode, Strength};
use crate::domain::{PackageId, Relation, Slot};

#[derive(Debug, Clone, Copy)]
struct Step<'g> {
    relation: Relation<'g>,
    /// Package that has to be placed first
    next: PackageId,
    strength: Strength,
}

#[derive(Debug)]
struct Frame<'g> {
    pkg: PackageId,
    steps: Vec<Step<'g>>,
    cursor: usize,
    /// Entered over a soft edge
    soft: bool,
}

impl<'g> OrderList<'g> {
    /// Places `root` and everything it has to follow
    ///
    /// Loops are recorded rather than returned; only depth and capacity
    /// violations are errors.
    pub(super) fn visit(&mut self, root: PackageId) -> Result<(), OrderError> {
        if self.flags.is(root, Flags::IN_LIST) {
            return Ok(());
        }

        let mut stack = vec![self.enter(root, false)];

        while let Some(frame) = stack.last_mut() {
            let Some(step) = frame.steps.get(frame.cursor).copied() else {
                let pkg = frame.pkg;
                stack.pop();
                if let Err(e) = self.place(pkg) {
                    self.unwind(&mut stack);
                    return Err(e);
                }
                continue;
            };
            frame.cursor += 1;

            let next = step.next;
            let state = self.flags.get(next);
            if !self.eligible[next.index()] || state.contains(Flags::IN_LIST) {
                continue;
            }

            if state.contains(Flags::LOOP) {
                // Cannot be placed in this pass
                if step.strength == Strength::Hard {
                    self.retreat(&mut stack);
                }
                continue;
            }

            if state.contains(Flags::ADD_PENDING) {
                if step.strength == Strength::Soft {
                    continue;
                }
                let removal = self.graph.package(next).action.is_remove();
                if self.mode == Mode::Unpack && state.contains(Flags::IMMEDIATE) && !removal {
                    continue;
                }

                let start = stack.iter().position(|f| f.pkg == next).unwrap_or(0);
                if let Some(cut) = soft_entry(&stack, start + 1) {
                    self.abandon(&mut stack, cut);
                    continue;
                }

                self.loops.push(LoopEdge::new(self.graph, &step.relation, next));
                for frame in &stack[start..] {
                    self.flags.set(frame.pkg, Flags::LOOP);
                }
                self.retreat(&mut stack);
                continue;
            }

            if stack.len() >= self.config.max_depth {
                self.unwind(&mut stack);
                return Err(OrderError::DepthExceeded {
                    package: self.graph.name(next).to_string(),
                    limit: self.config.max_depth,
                });
            }

            let frame = self.enter(next, step.strength == Strength::Soft);
            stack.push(frame);
        }

        Ok(())
    }

    fn enter(&mut self, pkg: PackageId, soft: bool) -> Frame<'g> {
        self.flags.set(pkg, Flags::ADD_PENDING);
        Frame {
            pkg,
            steps: self.steps(pkg),
            cursor: 0,
            soft,
        }
    }

    /// Gating edges of `pkg` under the current mode, in visiting order
    fn steps(&self, pkg: PackageId) -> Vec<Step<'g>> {
        let graph = self.graph;
        let package = graph.package(pkg);
        let policies = self.mode.policies();
        let ctx = Context {
            graph,
            flags: &self.flags,
        };

        if package.action.is_remove() {
            return graph
                .reverse(pkg, Slot::Current)
                .into_iter()
                .filter_map(|relation| {
                    strongest(policies.removal, &relation, &ctx).map(|strength| Step {
                        relation,
                        next: relation.owner,
                        strength,
                    })
                })
                .collect();
        }

        // Immediate packages configure right after unpacking, so their plain
        // dependencies have to be in place as well
        let immediate = self.mode == Mode::Unpack && self.flags.is(pkg, Flags::IMMEDIATE);
        let slot = if package.candidate.is_some() {
            Slot::Candidate
        } else {
            Slot::Current
        };

        let forward = graph.forward(pkg, slot).into_iter().filter_map(|relation| {
            strongest(policies.forward, &relation, &ctx).map(|strength| Step {
                relation,
                next: relation.target,
                strength: if immediate { Strength::Hard } else { strength },
            })
        });

        // Removals that conflict with this package have to go first
        let conflicting = graph
            .reverse(pkg, Slot::Current)
            .into_iter()
            .filter_map(|relation| {
                strongest(policies.reverse, &relation, &ctx).map(|strength| Step {
                    relation,
                    next: relation.owner,
                    strength,
                })
            });

        forward.chain(conflicting).collect()
    }

    fn place(&mut self, pkg: PackageId) -> Result<(), OrderError> {
        self.push(pkg)?;
        self.flags
            .replace(pkg, Flags::ADDED | Flags::IN_LIST, Flags::ADD_PENDING);
        Ok(())
    }

    /// Drops the frames from `cut` upwards without placing them
    fn abandon(&mut self, stack: &mut Vec<Frame<'g>>, cut: usize) {
        for frame in stack.drain(cut..) {
            self.flags.clear(frame.pkg, Flags::ADD_PENDING);
        }
    }

    /// Gives up on the top of the stack: back to the parent of the deepest
    /// soft entry if there is one, otherwise the whole visit
    fn retreat(&mut self, stack: &mut Vec<Frame<'g>>) {
        match soft_entry(stack, 1) {
            Some(cut) => self.abandon(stack, cut),
            None => self.unwind(stack),
        }
    }

    fn unwind(&mut self, stack: &mut Vec<Frame<'g>>) {
        self.abandon(stack, 0);
    }
}

/// Index of the deepest frame at or above `from` that was entered softly
fn soft_entry(stack: &[Frame<'_>], from: usize) -> Option<usize> {
    (from..stack.len()).rev().find(|&i| stack[i].soft)
}
