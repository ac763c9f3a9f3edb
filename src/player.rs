//! Walker physics: friction/acceleration movement with swept, per-axis
//! voxel collision.

use cairn_blocks::Block;
use cairn_geom::{Aabb, Vec3};

/// Ticks longer than this are clamped so a frame hitch cannot tunnel the
/// walker through geometry.
const MAX_STEP_DT: f32 = 0.05;
const SUB_STEPS: u32 = 4;
const COLLISION_EPS: f32 = 1e-4;

#[derive(Clone, Copy, Debug, Default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

#[derive(Debug)]
pub struct Walker {
    pub pos: Vec3, // feet position, x/z at center
    pub vel: Vec3,
    pub on_ground: bool,
    pub yaw: f32, // degrees
    pub width: f32,
    pub height: f32,
    pub eye_height: f32,
    pub gravity: f32,
    pub max_speed: f32,
    pub jump_speed: f32,
    pub ground_accel: f32,
    pub air_accel: f32,
    pub ground_friction: f32,
    pub air_friction: f32,
}

impl Walker {
    pub fn new(spawn: Vec3) -> Self {
        Self {
            pos: spawn,
            vel: Vec3::ZERO,
            on_ground: false,
            yaw: 0.0,
            width: 0.6,
            height: 1.8,
            eye_height: 1.6,
            gravity: 32.0,
            max_speed: 5.5,
            jump_speed: 9.0,
            ground_accel: 120.0,
            air_accel: 35.0,
            ground_friction: 12.0,
            air_friction: 2.0,
        }
    }

    pub fn eye_position(&self) -> Vec3 {
        Vec3::new(self.pos.x, self.pos.y + self.eye_height, self.pos.z)
    }

    fn aabb(&self) -> Aabb {
        Aabb::from_base(self.pos, self.width / 2.0, self.height)
    }

    /// Unit wish direction in the XZ plane from input flags and yaw.
    fn wish_dir(&self, input: &InputState) -> Vec3 {
        let yaw_rad = self.yaw.to_radians();
        let fwd = Vec3::new(yaw_rad.cos(), 0.0, yaw_rad.sin());
        let right = fwd.cross(Vec3::UP);
        let mut wish = Vec3::ZERO;
        if input.forward {
            wish += fwd;
        }
        if input.backward {
            wish -= fwd;
        }
        if input.right {
            wish += right;
        }
        if input.left {
            wish -= right;
        }
        if wish.length_sq() > 1e-6 {
            wish.normalized()
        } else {
            Vec3::ZERO
        }
    }

    /// Friction, then bounded acceleration toward the wish direction.
    /// Acceleration is capped against `max_speed` along the wish direction
    /// but total speed is never hard-clamped.
    fn apply_horizontal(&mut self, wish: Vec3, dt: f32) {
        let mut horiz = self.vel.horizontal();
        let speed = horiz.length();
        let friction = if self.on_ground {
            self.ground_friction
        } else {
            self.air_friction
        };
        let drop = speed.min((speed * friction * dt).max(0.0));
        if speed > 1e-6 {
            horiz = horiz * ((speed - drop).max(0.0) / speed);
        } else {
            horiz = Vec3::ZERO;
        }

        if wish.length_sq() > 1e-6 {
            let accel = if self.on_ground {
                self.ground_accel
            } else {
                self.air_accel
            };
            let add_speed = self.max_speed - horiz.dot(wish);
            if add_speed > 0.0 {
                let accel_speed = (accel * dt).min(add_speed);
                horiz += wish * accel_speed;
            }
        }

        self.vel.x = horiz.x;
        self.vel.z = horiz.z;
    }

    /// Advances one tick against the sampled voxel world.
    pub fn update<F>(&mut self, input: &InputState, dt: f32, sample: &F)
    where
        F: Fn(i32, i32, i32) -> Block,
    {
        let dt = dt.min(MAX_STEP_DT);
        self.vel.y -= self.gravity * dt;
        if input.jump && self.on_ground {
            self.vel.y = self.jump_speed;
            self.on_ground = false;
        }
        let wish = self.wish_dir(input);
        self.apply_horizontal(wish, dt);
        self.collide_and_slide(dt, sample);
        self.pos.y = self.pos.y.max(0.0);
    }

    /// Splits the tick into sub-steps and resolves each axis separately
    /// (Y, then X, then Z) so the walker slides along obstructions instead
    /// of sticking to them.
    fn collide_and_slide<F>(&mut self, dt: f32, sample: &F)
    where
        F: Fn(i32, i32, i32) -> Block,
    {
        let mut remaining = dt;
        self.on_ground = false;
        for i in 0..SUB_STEPS {
            if remaining <= COLLISION_EPS {
                break;
            }
            let step = remaining / (SUB_STEPS - i) as f32;
            self.sweep_y(self.vel.y * step, sample);
            self.sweep_x(self.vel.x * step, sample);
            self.sweep_z(self.vel.z * step, sample);
            remaining -= step;
        }
    }

    fn sweep_y<F>(&mut self, mut amount: f32, sample: &F)
    where
        F: Fn(i32, i32, i32) -> Block,
    {
        if amount.abs() <= COLLISION_EPS {
            return;
        }
        let bb = self.aabb();
        let target_min = bb.min.y + amount;
        let target_max = bb.max.y + amount;
        let (x0, x1) = Aabb::cell_span(bb.min.x, bb.max.x);
        let (z0, z1) = Aabb::cell_span(bb.min.z, bb.max.z);
        let (y0, y1) = Aabb::cell_span(target_min, target_max);
        'scan: for y in y0..=y1 {
            for x in x0..=x1 {
                for z in z0..=z1 {
                    if !sample(x, y, z).is_solid() {
                        continue;
                    }
                    let cell_bottom = y as f32;
                    let cell_top = (y + 1) as f32;
                    if amount > 0.0 && bb.max.y <= cell_bottom && target_max > cell_bottom {
                        amount = (cell_bottom - bb.max.y - COLLISION_EPS).max(0.0);
                        self.vel.y = 0.0;
                        break 'scan;
                    } else if amount < 0.0 && bb.min.y >= cell_top && target_min < cell_top {
                        amount = (cell_top - bb.min.y + COLLISION_EPS).min(0.0);
                        self.vel.y = 0.0;
                        self.on_ground = true;
                        break 'scan;
                    }
                }
            }
        }
        self.pos.y += amount;
    }

    fn sweep_x<F>(&mut self, mut amount: f32, sample: &F)
    where
        F: Fn(i32, i32, i32) -> Block,
    {
        if amount.abs() <= COLLISION_EPS {
            return;
        }
        let bb = self.aabb();
        let target_min = bb.min.x + amount;
        let target_max = bb.max.x + amount;
        let (y0, y1) = Aabb::cell_span(bb.min.y, bb.max.y);
        let (z0, z1) = Aabb::cell_span(bb.min.z, bb.max.z);
        let (x0, x1) = Aabb::cell_span(target_min, target_max);
        'scan: for x in x0..=x1 {
            for y in y0..=y1 {
                for z in z0..=z1 {
                    if !sample(x, y, z).is_solid() {
                        continue;
                    }
                    let cell_low = x as f32;
                    let cell_high = (x + 1) as f32;
                    if amount > 0.0 && bb.max.x <= cell_low && target_max > cell_low {
                        amount = (cell_low - bb.max.x - COLLISION_EPS).max(0.0);
                        self.vel.x = 0.0;
                        break 'scan;
                    } else if amount < 0.0 && bb.min.x >= cell_high && target_min < cell_high {
                        amount = (cell_high - bb.min.x + COLLISION_EPS).min(0.0);
                        self.vel.x = 0.0;
                        break 'scan;
                    }
                }
            }
        }
        self.pos.x += amount;
    }

    fn sweep_z<F>(&mut self, mut amount: f32, sample: &F)
    where
        F: Fn(i32, i32, i32) -> Block,
    {
        if amount.abs() <= COLLISION_EPS {
            return;
        }
        let bb = self.aabb();
        let target_min = bb.min.z + amount;
        let target_max = bb.max.z + amount;
        let (y0, y1) = Aabb::cell_span(bb.min.y, bb.max.y);
        let (x0, x1) = Aabb::cell_span(bb.min.x, bb.max.x);
        let (z0, z1) = Aabb::cell_span(target_min, target_max);
        'scan: for z in z0..=z1 {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    if !sample(x, y, z).is_solid() {
                        continue;
                    }
                    let cell_low = z as f32;
                    let cell_high = (z + 1) as f32;
                    if amount > 0.0 && bb.max.z <= cell_low && target_max > cell_low {
                        amount = (cell_low - bb.max.z - COLLISION_EPS).max(0.0);
                        self.vel.z = 0.0;
                        break 'scan;
                    } else if amount < 0.0 && bb.min.z >= cell_high && target_min < cell_high {
                        amount = (cell_high - bb.min.z + COLLISION_EPS).min(0.0);
                        self.vel.z = 0.0;
                        break 'scan;
                    }
                }
            }
        }
        self.pos.z += amount;
    }
}
