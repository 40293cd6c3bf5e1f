pub mod gmsh;
