extern crate castor3d;
extern crate cgmath;
extern crate env_logger;
#[macro_use]
extern crate log;

use std::rc::Rc;
use std::thread;
use std::time::Duration;

use castor3d::animation::Animable;
use castor3d::{Geometry, Mesh, ObjectKind, Scene, Skeleton};
use cgmath::{Deg, Matrix4, Quaternion, Rotation3, SquareMatrix, Vector3};

const STEP_LENGTH: f32 = 1.0;
const FRAMES: usize = 30;

fn build_skeleton() -> Skeleton {
    let mut skeleton = Skeleton::new();
    let hip = skeleton.add_bone("hip", Matrix4::identity());
    let knee = skeleton.add_bone("knee", Matrix4::from_translation(Vector3::new(0.0, -0.5, 0.0)));
    skeleton.add_child(hip, knee);

    let mut walk = castor3d::Animation::new("walk");
    walk.set_looped(true);
    let moving_hip = walk.add_moving_bone(&skeleton, hip).unwrap();
    let moving_knee = walk.add_moving_bone(&skeleton, knee).unwrap();
    walk.add_child(moving_hip, moving_knee);
    let keys: [(f32, f32); 3] = [(0.0, -20.0), (STEP_LENGTH * 0.5, 20.0), (STEP_LENGTH, -20.0)];
    for &(time, angle) in &keys {
        *walk
            .moving_object_mut(moving_hip)
            .unwrap()
            .add_rotate_key_frame(time) = Quaternion::from_angle_x(Deg(angle));
        *walk
            .moving_object_mut(moving_knee)
            .unwrap()
            .add_rotate_key_frame(time) = Quaternion::from_angle_x(Deg(-angle.abs()));
    }
    skeleton.add_animation(walk);
    skeleton
}

fn main() {
    env_logger::init();

    let mut scene = Scene::new("walk");
    let mut mesh = Mesh::new("legs");
    mesh.set_skeleton(Rc::new(build_skeleton()));
    let mesh = Rc::new(mesh);

    let mut group = castor3d::AnimatedObjectGroup::new("walkers");
    group.add_animation("walk");
    group.add_animation("bob");
    let mut geometries = Vec::new();
    for i in 0 .. 3 {
        let name = format!("walker_{}", i);
        let node = scene.create_node(&name, None);
        scene.set_position(node, [i as f32 * 2.0, 0.0, 0.0]);
        let object = scene.create_object(&name, ObjectKind::Geometry, Some(node));

        let mut geometry = Geometry::new(&name, Some(mesh.clone()));
        {
            let bob = geometry.create_animation("bob");
            bob.set_looped(true);
            let moving = bob.add_moving_object(scene.object(object).unwrap()).unwrap();
            let moving = bob.moving_object_mut(moving).unwrap();
            *moving.add_translate_key_frame(0.0) = Vector3::new(i as f32 * 2.0, 0.0, 0.0);
            *moving.add_translate_key_frame(0.5) = Vector3::new(i as f32 * 2.0, 0.1, 0.0);
            *moving.add_translate_key_frame(1.0) = Vector3::new(i as f32 * 2.0, 0.0, 0.0);
        }
        let geometry = Rc::new(geometry);
        if let Some(animated) = group.create_object(&name) {
            animated.set_geometry(&geometry);
        }
        geometries.push(geometry);
    }
    group.start_all_animations();
    *scene.create_animated_object_group("walkers") = group;

    for frame in 0 .. FRAMES {
        thread::sleep(Duration::from_millis(33));
        scene.update();

        let walker = scene.find_node("walker_1").unwrap();
        let position = scene.derived_position(walker).unwrap();
        let knee = scene
            .animated_object_group("walkers")
            .and_then(|group| group.object("walker_1"))
            .map(|object| object.skinning_matrices()[1])
            .unwrap_or_else(Matrix4::identity);
        info!("frame {}: walker_1 at {:?}, knee {:?}", frame, position, knee.w.truncate());
        println!("frame {:2}: height {:.3}", frame, position.y);
    }
}
