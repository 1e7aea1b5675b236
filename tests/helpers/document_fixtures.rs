//! Common `.feb` documents for tests.

/// One tet4 element under a neo-Hookean material, fixed on one face and
/// pressed on another through a linear load curve.
pub const TET4: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<febio_spec version="3.0">
	<Module type="solid"/>
	<Control>
		<analysis>STATIC</analysis>
		<time_steps>10</time_steps>
		<step_size>0.1</step_size>
		<solver type="solid">
			<max_refs>15</max_refs>
			<max_ups>10</max_ups>
			<diverge_reform>1</diverge_reform>
			<reform_each_time_step>1</reform_each_time_step>
			<dtol>0.001</dtol>
			<etol>0.01</etol>
			<rtol>0</rtol>
			<lstol>0.9</lstol>
			<min_residual>1e-20</min_residual>
			<qnmethod>BFGS</qnmethod>
			<rhoi>0</rhoi>
		</solver>
		<time_stepper>
			<dtmin>0.01</dtmin>
			<dtmax>0.1</dtmax>
			<max_retries>5</max_retries>
			<opt_iter>10</opt_iter>
		</time_stepper>
	</Control>
	<Globals>
		<Constants>
			<T>0</T>
			<R>0</R>
			<Fc>0</Fc>
		</Constants>
	</Globals>
	<Material>
		<material id="1" name="Material1" type="neo-Hookean">
			<density>1</density>
			<E>0.3</E>
			<v>0.48</v>
		</material>
	</Material>
	<Mesh>
		<Nodes name="Object1">
			<node id="1">0,0,0</node>
			<node id="2">1,0,0</node>
			<node id="3">0,1,0</node>
			<node id="4">0,0,1</node>
		</Nodes>
		<Elements type="tet4" name="Part1">
			<elem id="1">1,2,3,4</elem>
		</Elements>
		<Surface name="FixedDisplacement1">
			<tri3 id="1">1,2,3</tri3>
		</Surface>
		<Surface name="PressureLoad1">
			<tri3 id="1">2,3,4</tri3>
		</Surface>
	</Mesh>
	<MeshDomains>
		<SolidDomain name="Part1" mat="Material1"/>
	</MeshDomains>
	<Boundary>
		<bc name="FixedDisplacement1" type="fix" node_set="@surface:FixedDisplacement1">
			<dofs>x,y,z</dofs>
		</bc>
	</Boundary>
	<Loads>
		<surface_load name="PressureLoad1" type="pressure" surface="PressureLoad1">
			<pressure lc="1">0.016</pressure>
			<linear>0</linear>
			<symmetric_stiffness>1</symmetric_stiffness>
		</surface_load>
	</Loads>
	<LoadData>
		<load_controller id="1" type="loadcurve">
			<interpolate>LINEAR</interpolate>
			<points>
				<point>0,0</point>
				<point>1,1</point>
			</points>
		</load_controller>
	</LoadData>
	<Output>
		<plotfile type="febio">
			<var type="displacement"/>
			<var type="stress"/>
		</plotfile>
		<logfile file="tet4.log">
			<element_data data="Ex;Ey;Ez" delim=","/>
			<element_data data="sx;sy;sz" name="stress" delim=",">1</element_data>
		</logfile>
	</Output>
</febio_spec>
"#;

/// Material, bc, load and section types with no built-in schema, plus
/// unknown fields on known types.
pub const PASSTHROUGH: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<febio_spec version="3.0">
	<Material>
		<material id="3" name="Rubber" type="Ogden">
			<density>1.1</density>
			<k>100</k>
			<c1>1.5</c1>
			<m1>2</m1>
			<fiber type="vector">1,0,0</fiber>
		</material>
		<material id="7" name="Steel" type="isotropic elastic">
			<E>210000</E>
			<note>from datasheet</note>
			<v>0.3</v>
		</material>
	</Material>
	<Contact>
		<contact type="sliding-elastic" surface_pair="Pair1">
			<penalty>1</penalty>
			<two_pass>0</two_pass>
		</contact>
	</Contact>
	<Mesh>
		<Nodes name="All">
			<node id="1">0,0,0</node>
			<node id="2">1,0,0</node>
			<node id="3">1,1,0</node>
			<node id="4">0,1,0</node>
			<node id="5">0.5,0.5,1</node>
		</Nodes>
		<Elements type="pyra5" name="Block">
			<elem id="1">1,2,3,4,5</elem>
		</Elements>
		<NodeSet name="Base">
			<node id="1"/>
			<node id="2"/>
		</NodeSet>
		<DiscreteSet name="Springs">
			<delem>1,5</delem>
		</DiscreteSet>
	</Mesh>
	<MeshDomains>
		<SolidDomain name="Block" mat="Rubber" type="udg-hex"/>
	</MeshDomains>
	<Boundary>
		<bc name="Hinge" type="hinge-joint" node_set="Base">
			<axis>0,0,1</axis>
		</bc>
		<bc type="linear constraint">
			<node id="1" dof="x">1</node>
		</bc>
	</Boundary>
	<Loads>
		<nodal_load name="Tip" type="nodal_force" node_set="Base">
			<value lc="2">1,0,0</value>
		</nodal_load>
	</Loads>
	<LoadData>
		<load_controller id="2" type="loadcurve">
			<interpolate>SMOOTH</interpolate>
			<extend>EXTRAPOLATE</extend>
			<points>
				<point>0,0</point>
				<point>0.5,2</point>
				<point>1,1</point>
			</points>
		</load_controller>
		<load_controller id="5" type="math">
			<math>sin(t)</math>
		</load_controller>
	</LoadData>
</febio_spec>
"#;

/// Sections out of conventional order, with a forward `lc` reference and
/// a must-point `dtmax`.
pub const REORDERED: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<febio_spec version="3.0">
	<LoadData>
		<load_controller id="4" type="loadcurve">
			<interpolate>STEP</interpolate>
			<points>
				<point>0,0</point>
				<point>1,0.5</point>
			</points>
		</load_controller>
	</LoadData>
	<Loads>
		<surface_load name="Push" type="traction" surface="Top">
			<scale lc="4">2.5</scale>
			<traction>0,0,-1</traction>
		</surface_load>
	</Loads>
	<Control>
		<analysis>DYNAMIC</analysis>
		<time_steps>20</time_steps>
		<step_size>0.05</step_size>
		<plot_level>PLOT_MUST_POINTS</plot_level>
		<time_stepper type="default">
			<dtmax lc="4">0.1</dtmax>
		</time_stepper>
	</Control>
	<Mesh>
		<Surface name="Top">
			<quad4 id="1">1,2,3,4</quad4>
		</Surface>
		<Nodes name="Top nodes">
			<node id="1">0,0,1</node>
			<node id="2">1,0,1</node>
			<node id="3">1,1,1</node>
			<node id="4">0,1,1</node>
		</Nodes>
	</Mesh>
	<Module type="solid"/>
</febio_spec>
"#;

/// A boundary condition on surface `S` with faces {1,2,3} and {3,4,5}.
pub const TWO_FACE_SURFACE: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<febio_spec version="3.0">
	<Mesh>
		<Nodes name="N">
			<node id="1">0,0,0</node>
			<node id="2">1,0,0</node>
			<node id="3">1,1,0</node>
			<node id="4">0,1,0</node>
			<node id="5">0,2,0</node>
		</Nodes>
		<Surface name="S">
			<tri3 id="1">1,2,3</tri3>
			<tri3 id="2">3,4,5</tri3>
		</Surface>
	</Mesh>
	<Boundary>
		<bc name="Clamp" type="fix" node_set="@surface:S">
			<dofs>x,y,z</dofs>
		</bc>
	</Boundary>
</febio_spec>
"#;

/// Control children in a FEBio Studio order, plus globals that need
/// passthrough: a repeated constant and one carrying a unit.
pub const STUDIO_CONTROL: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<febio_spec version="3.0">
	<Module type="solid"/>
	<Control>
		<analysis>STATIC</analysis>
		<time_steps>10</time_steps>
		<step_size>0.1</step_size>
		<plot_level>PLOT_MUST_POINTS</plot_level>
		<solver type="solid">
			<symmetric_stiffness>0</symmetric_stiffness>
			<max_refs>15</max_refs>
			<etol>0.01</etol>
		</solver>
		<time_stepper type="default">
			<opt_iter>10</opt_iter>
			<aggressiveness>0</aggressiveness>
			<dtmin>0.01</dtmin>
		</time_stepper>
		<output_level>OUTPUT_MUST_POINTS</output_level>
	</Control>
	<Globals>
		<Solutes>
			<solute id="1" name="neutral"/>
		</Solutes>
		<Constants>
			<T>0</T>
			<T>300</T>
			<R unit="J/mol/K">8.314</R>
			<Fc>96485</Fc>
		</Constants>
	</Globals>
</febio_spec>
"#;
